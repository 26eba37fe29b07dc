// crates/pavilion-resolver/src/permute.rs
// ============================================================================
// Module: Permutation Expansion
// Description: Expands `permute_on` into one variable store per combination
//              of the named multi-valued variables.
// Purpose: Turn one test spec into the candidate run set before the
//          scheduler and skip-condition stages run.
// Dependencies: pavilion-core, crate::error
// ============================================================================

//! ## Overview
//! `permute_on` names variables that must be resolved to a single value per
//! candidate run rather than left multi-valued for `[~ ~]` iteration.
//! [`expand_permutations`] computes the Cartesian product of their value
//! counts and returns one [`VariableStore`] per combination, each with those
//! variables collapsed to a single value at the same scope they were found.

use pavilion_core::ResolutionError;
use pavilion_core::Scope;
use pavilion_core::Variable;
use pavilion_core::VariableStore;

use crate::error::ResolverError;

/// Expands `permute_on` against `store`, returning one store per
/// combination. An empty `permute_on` returns a single clone of `store`.
///
/// # Errors
///
/// Returns [`ResolverError::Resolution`] wrapping
/// [`ResolutionError::SchedulerVariableBeforeDispatch`] if a named variable
/// is in `sched` scope, or wrapping [`ResolutionError::UnknownReference`] if
/// a named variable is not bound at all.
pub fn expand_permutations(
    store: &VariableStore,
    permute_on: &[String],
) -> Result<Vec<VariableStore>, ResolverError> {
    if permute_on.is_empty() {
        return Ok(vec![store.clone()]);
    }

    let mut resolved = Vec::with_capacity(permute_on.len());
    for name in permute_on {
        let (scope, variable) =
            store.lookup(name).map_err(|_| ResolutionError::UnknownReference(name.clone()))?;
        if scope == Scope::Sched {
            return Err(ResolverError::Resolution(ResolutionError::SchedulerVariableBeforeDispatch(
                name.clone(),
            )));
        }
        resolved.push((name.clone(), scope, variable.clone()));
    }

    let lengths: Vec<usize> = resolved.iter().map(|(_, _, v)| v.len().max(1)).collect();
    let total: usize = lengths.iter().product();
    let mut combinations = Vec::with_capacity(total);
    let mut indices = vec![0usize; resolved.len()];

    for _ in 0 .. total {
        let mut variant = store.clone();
        for ((name, scope, variable), &index) in resolved.iter().zip(indices.iter()) {
            if let Some(value) = variable.get(index) {
                let mut single = Variable::new(vec![value.clone()])?;
                single.expected = variable.expected;
                single.appended = variable.appended;
                variant.set(*scope, name.clone(), single);
            }
        }
        combinations.push(variant);
        advance(&mut indices, &lengths);
    }

    Ok(combinations)
}

fn advance(indices: &mut [usize], lengths: &[usize]) {
    for i in (0 .. indices.len()).rev() {
        indices[i] += 1;
        if indices[i] < lengths[i] {
            return;
        }
        indices[i] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::VarValue;

    #[test]
    fn single_variable_produces_one_store_per_value() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Var,
            "compiler",
            Variable::new(vec![
                VarValue::Scalar("gcc".to_string()),
                VarValue::Scalar("clang".to_string()),
            ])
            .unwrap(),
        );
        let variants = expand_permutations(&store, &["compiler".to_string()]).unwrap();
        assert_eq!(variants.len(), 2);
        let values: Vec<_> = variants
            .iter()
            .map(|v| v.get_scoped(Scope::Var, "compiler").unwrap().get(0).cloned())
            .collect();
        assert_eq!(
            values,
            vec![
                Some(VarValue::Scalar("gcc".to_string())),
                Some(VarValue::Scalar("clang".to_string()))
            ]
        );
    }

    #[test]
    fn two_variables_produce_cartesian_product() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Var,
            "compiler",
            Variable::new(vec![VarValue::Scalar("gcc".to_string()), VarValue::Scalar("clang".to_string())])
                .unwrap(),
        );
        store.set(
            Scope::Var,
            "opt",
            Variable::new(vec![VarValue::Scalar("O2".to_string()), VarValue::Scalar("O3".to_string())])
                .unwrap(),
        );
        let variants =
            expand_permutations(&store, &["compiler".to_string(), "opt".to_string()]).unwrap();
        assert_eq!(variants.len(), 4);
    }

    #[test]
    fn rejects_scheduler_scope_variable() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Sched,
            "alloc_id",
            Variable::new(vec![VarValue::Scalar("1".to_string())]).unwrap(),
        );
        let err = expand_permutations(&store, &["alloc_id".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Resolution(ResolutionError::SchedulerVariableBeforeDispatch(_))
        ));
    }
}
