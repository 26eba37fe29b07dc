// crates/pavilion-build/src/script.rs
// ============================================================================
// Module: Shell Script Composition
// Description: Composes the POSIX shell script run for a build or a test,
//              from module actions, environment exports, and commands.
// Purpose: Share one script-writer between the build engine and the run
//          script writer, since both follow the same shape (§4.3, §4.4).
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! A script is: module manipulations (each followed by a verification line
//! that aborts the script on failure), environment exports, then the
//! configured commands in order. The default module wrapper emits plain
//! `module` command invocations; a registered [`ModuleWrapper`] may override
//! the shell lines generated for any action.

use std::collections::BTreeMap;

use pavilion_core::error::BuildError;
use pavilion_core::interfaces::ModuleWrapper;
use pavilion_core::interfaces::Registry;
use pavilion_core::interfaces::RegistryError;
use pavilion_core::spec::ModuleAction;

/// Composes a POSIX shell script body from module actions, environment
/// exports, and commands, in that order.
///
/// `wrappers` is consulted first for a plugin named after the action's
/// module name; if none matches, `default_wrapper` is used for every action.
///
/// # Errors
///
/// Returns [`BuildError`] if a wrapper fails to generate lines for an action.
pub fn compose(
    modules: &[ModuleAction],
    env: &BTreeMap<String, String>,
    cmds: &[String],
    wrappers: &Registry<dyn ModuleWrapper>,
) -> Result<String, BuildError> {
    let mut lines = vec!["#!/bin/sh".to_string(), "set -e".to_string()];

    for action in modules {
        let generated = generate_module_lines(action, wrappers)?;
        lines.extend(generated);
    }

    for (key, value) in env {
        lines.push(format!("export {key}={}", shell_quote(value)));
    }

    lines.extend(cmds.iter().cloned());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

fn generate_module_lines(
    action: &ModuleAction,
    wrappers: &Registry<dyn ModuleWrapper>,
) -> Result<Vec<String>, BuildError> {
    match wrappers.resolve("module") {
        Ok(wrapper) => wrapper.generate(action),
        Err(RegistryError::NotFound(_) | RegistryError::Denied(_)) => Ok(default_module_lines(action)),
    }
}

fn default_module_lines(action: &ModuleAction) -> Vec<String> {
    let (command, verify_target) = match action {
        ModuleAction::Load { name } => (format!("module load {name}"), name.clone()),
        ModuleAction::Unload { name } => (format!("module unload {name}"), name.clone()),
        ModuleAction::Swap { old, new } => (format!("module swap {old} {new}"), new.clone()),
    };
    vec![
        command,
        format!(
            "module is-loaded {verify_target} || {{ echo \"module action failed: {verify_target}\" >&2; exit 1; }}"
        ),
    ]
}

/// Quotes a value for safe inclusion in a POSIX `export` line.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_modules_env_and_cmds_in_order() {
        let modules = vec![ModuleAction::Load { name: "gcc/12".to_string() }];
        let mut env = BTreeMap::new();
        env.insert("CC".to_string(), "gcc".to_string());
        let cmds = vec!["make all".to_string()];
        let wrappers: Registry<dyn ModuleWrapper> = Registry::new();

        let script = compose(&modules, &env, &cmds, &wrappers).unwrap();
        let module_pos = script.find("module load gcc/12").unwrap();
        let verify_pos = script.find("module is-loaded gcc/12").unwrap();
        let env_pos = script.find("export CC=").unwrap();
        let cmd_pos = script.find("make all").unwrap();
        assert!(module_pos < verify_pos);
        assert!(verify_pos < env_pos);
        assert!(env_pos < cmd_pos);
    }

    #[test]
    fn quotes_values_containing_single_quotes() {
        let mut env = BTreeMap::new();
        env.insert("MSG".to_string(), "it's fine".to_string());
        let wrappers: Registry<dyn ModuleWrapper> = Registry::new();
        let script = compose(&[], &env, &[], &wrappers).unwrap();
        assert!(script.contains(r"export MSG='it'\''s fine'"));
    }
}
