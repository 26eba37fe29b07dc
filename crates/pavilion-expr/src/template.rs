// crates/pavilion-expr/src/template.rs
// ============================================================================
// Module: Template Substitution
// Description: Scans source text for `{{ }}` expressions, `[~ ~<sep>]`
//              iterations, and backslash escapes, producing the fully
//              substituted string.
// Purpose: The top-level entry point a caller (resolver, build script
//          writer) uses to render one configured string value.
// Dependencies: crate::parser, crate::eval, crate::value
// ============================================================================

//! ## Overview
//! [`render`] walks the source string once, left to right. An iteration
//! block expands to one copy of its interior per combination of the
//! multi-valued variables referenced within it (the Cartesian product),
//! joined by its separator; nested iterations are rejected rather than
//! silently flattened.

use std::collections::BTreeSet;

use pavilion_core::VariableStore;
use pavilion_core::interfaces::ExpressionFunction;
use pavilion_core::interfaces::Registry;

use crate::error::ExprError;
use crate::eval::EvalContext;
use crate::eval::evaluate;
use crate::parser::parse;
use crate::reference::IterationBindings;
use crate::reference::parse_reference;

/// Renders `source`, substituting every expression and iteration block.
///
/// # Errors
///
/// Returns [`ExprError`] on any malformed block or evaluation failure.
pub fn render(
    source: &str,
    store: &VariableStore,
    functions: &Registry<dyn ExpressionFunction>,
    pre_dispatch: bool,
) -> Result<String, ExprError> {
    let bindings = IterationBindings::new();
    render_scoped(source, store, functions, pre_dispatch, &bindings, false)
}

fn render_scoped(
    source: &str,
    store: &VariableStore,
    functions: &Registry<dyn ExpressionFunction>,
    pre_dispatch: bool,
    bindings: &IterationBindings,
    inside_iteration: bool,
) -> Result<String, ExprError> {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(escaped) = match_escape(source, i) {
            out.push_str(escaped.1);
            i = escaped.0;
            continue;
        }
        if source[i ..].starts_with("{{") {
            let (end, expr_src) = find_block_end(source, i + 2, "}}")?;
            let (expr_text, format_spec) = split_format_spec(expr_src);
            let expr = parse(expr_text)?;
            let ctx = EvalContext { store, bindings, pre_dispatch, functions };
            let value = evaluate(&expr, &ctx)?;
            out.push_str(&apply_format_spec(&value, format_spec)?);
            i = end;
            continue;
        }
        if source[i ..].starts_with("[~") {
            if inside_iteration {
                return Err(ExprError::NestedIteration(i));
            }
            let (end, body_and_sep) = find_iteration_end(source, i + 2)?;
            let (body, separator) = body_and_sep;
            out.push_str(&render_iteration(body, separator, store, functions, pre_dispatch, bindings)?);
            i = end;
            continue;
        }
        let ch_len = source[i ..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&source[i .. i + ch_len]);
        i += ch_len;
    }

    Ok(out)
}

fn match_escape(source: &str, i: usize) -> Option<(usize, &str)> {
    let rest = &source[i ..];
    if let Some(stripped) = rest.strip_prefix("\\\\{{") {
        let _ = stripped;
        return Some((i + 3, "\\"));
    }
    if rest.starts_with("\\{{") {
        return Some((i + 3, "{{"));
    }
    if rest.starts_with("\\[~") {
        return Some((i + 3, "[~"));
    }
    if rest.starts_with("\\~") {
        return Some((i + 2, "~"));
    }
    None
}

fn find_block_end<'a>(source: &'a str, start: usize, close: &str) -> Result<(usize, &'a str), ExprError> {
    source[start ..].find(close).map_or(Err(ExprError::UnexpectedEof), |rel| {
        let close_at = start + rel;
        Ok((close_at + close.len(), &source[start .. close_at]))
    })
}

/// Finds the matching `~<sep>]` for an iteration opened at `start` (just
/// past `[~`), returning the body text and the separator (the run of
/// characters between the final `~` and `]`).
fn find_iteration_end(source: &str, start: usize) -> Result<(usize, (&str, &str)), ExprError> {
    let rest = &source[start ..];
    let tilde_at = rest.find('~').ok_or(ExprError::UnexpectedEof)?;
    let after_tilde = &rest[tilde_at + 1 ..];
    let bracket_rel = after_tilde.find(']').ok_or(ExprError::UnexpectedEof)?;
    let separator = &after_tilde[.. bracket_rel];
    let body = &rest[.. tilde_at];
    let end = start + tilde_at + 1 + bracket_rel + 1;
    Ok((end, (body, separator)))
}

fn render_iteration(
    body: &str,
    separator: &str,
    store: &VariableStore,
    functions: &Registry<dyn ExpressionFunction>,
    pre_dispatch: bool,
    outer_bindings: &IterationBindings,
) -> Result<String, ExprError> {
    let names = multi_valued_names_in(body, store)?;
    if names.is_empty() {
        let rendered = render_scoped(body, store, functions, pre_dispatch, outer_bindings, true)?;
        return Ok(rendered);
    }

    let mut lengths = Vec::with_capacity(names.len());
    for name in &names {
        let (_, variable) = store.lookup(name).map_err(|_| ExprError::UnknownReference(name.clone()))?;
        lengths.push(variable.len());
    }

    let mut pieces = Vec::new();
    let mut indices = vec![0usize; names.len()];
    let total: usize = lengths.iter().product();
    for _ in 0 .. total.max(1) {
        let mut bindings = outer_bindings.clone();
        for (name, index) in names.iter().zip(indices.iter()) {
            bindings.insert(name.clone(), *index);
        }
        pieces.push(render_scoped(body, store, functions, pre_dispatch, &bindings, true)?);
        advance_odometer(&mut indices, &lengths);
    }

    Ok(pieces.join(separator))
}

fn advance_odometer(indices: &mut [usize], lengths: &[usize]) {
    for i in (0 .. indices.len()).rev() {
        indices[i] += 1;
        if indices[i] < lengths[i] {
            return;
        }
        indices[i] = 0;
    }
}

/// Finds every distinct multi-valued variable name directly referenced
/// (not via a nested expression result) inside an iteration body.
fn multi_valued_names_in(body: &str, store: &VariableStore) -> Result<Vec<String>, ExprError> {
    let mut names = BTreeSet::new();
    let mut i = 0;
    let bytes = body.as_bytes();
    while i < bytes.len() {
        if body[i ..].starts_with("{{") {
            let (end, expr_src) = find_block_end(body, i + 2, "}}")?;
            let (expr_text, _) = split_format_spec(expr_src);
            collect_reference_names(expr_text, &mut names);
            i = end;
        } else {
            i += 1;
        }
    }

    let mut multi_valued = Vec::new();
    for name in names {
        let parsed = parse_reference(&name)?;
        if parsed.path.first().is_some_and(|s| matches!(s, crate::reference::PathSegment::Index(_))) {
            continue;
        }
        if let Ok((_, variable)) = store.lookup(&parsed.name)
            && variable.is_multi_valued()
        {
            multi_valued.push(parsed.name.clone());
        }
    }
    multi_valued.sort();
    multi_valued.dedup();
    Ok(multi_valued)
}

fn collect_reference_names(expr_text: &str, names: &mut BTreeSet<String>) {
    let mut chars = expr_text.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut end = start + ch.len_utf8();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '*' {
                    end += c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            names.insert(expr_text[start .. end].to_string());
        }
    }
}

/// Splits `<expr>` from an optional trailing `: <format spec>` at the
/// top-level colon (one not enclosed in parentheses or a string literal).
fn split_format_spec(expr_src: &str) -> (&str, Option<&str>) {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    for (i, ch) in expr_src.char_indices() {
        match in_string {
            Some(q) if ch == q => in_string = None,
            Some(_) => continue,
            None => {}
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '(' => depth += 1,
            ')' => depth -= 1,
            ':' if depth == 0 => return (&expr_src[.. i], Some(&expr_src[i + 1 ..])),
            _ => {}
        }
    }
    (expr_src, None)
}

fn apply_format_spec(value: &crate::value::Value, spec: Option<&str>) -> Result<String, ExprError> {
    let Some(spec) = spec.map(str::trim) else {
        return Ok(value.render());
    };
    if spec.is_empty() {
        return Ok(value.render());
    }
    match spec.chars().last() {
        Some('d') => match value {
            crate::value::Value::Int(i) => Ok(i.to_string()),
            crate::value::Value::Float(f) => Ok((*f as i64).to_string()),
            _ => Err(ExprError::InvalidFormatSpec(spec.to_string())),
        },
        Some('f') => {
            let precision = spec[.. spec.len() - 1].trim_start_matches('.').parse::<usize>().unwrap_or(6);
            match value {
                crate::value::Value::Int(i) => Ok(format!("{:.*}", precision, *i as f64)),
                crate::value::Value::Float(f) => Ok(format!("{f:.precision$}")),
                _ => Err(ExprError::InvalidFormatSpec(spec.to_string())),
            }
        }
        Some('s') => Ok(value.render()),
        _ => Err(ExprError::InvalidFormatSpec(spec.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::Scope;
    use pavilion_core::VarValue;
    use pavilion_core::Variable;

    fn functions() -> Registry<dyn ExpressionFunction> {
        Registry::new()
    }

    #[test]
    fn renders_plain_text_unchanged() {
        let store = VariableStore::new();
        assert_eq!(render("hello world", &store, &functions(), false).unwrap(), "hello world");
    }

    #[test]
    fn renders_expression_block() {
        let mut store = VariableStore::new();
        store.set(Scope::Var, "x", Variable::new(vec![VarValue::Scalar("2".to_string())]).unwrap());
        let result = render("value: {{ x + 1 }}", &store, &functions(), false).unwrap();
        assert_eq!(result, "value: 3");
    }

    #[test]
    fn handles_escaped_expression_start() {
        let store = VariableStore::new();
        let result = render(r"literal \{{ braces", &store, &functions(), false).unwrap();
        assert_eq!(result, "literal {{ braces");
    }

    #[test]
    fn iterates_over_multi_valued_variable() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Var,
            "n",
            Variable::new(vec![
                VarValue::Scalar("1".to_string()),
                VarValue::Scalar("2".to_string()),
                VarValue::Scalar("3".to_string()),
            ])
            .unwrap(),
        );
        let result = render("[~{{ n }}~,]", &store, &functions(), false).unwrap();
        assert_eq!(result, "1,2,3");
    }

    #[test]
    fn applies_decimal_format_spec() {
        let store = VariableStore::new();
        let result = render("{{ 3.14159 : .2f }}", &store, &functions(), false).unwrap();
        assert_eq!(result, "3.14");
    }
}
