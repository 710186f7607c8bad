//! Effective action lists: merging global defaults with project actions and placing the shell.

use std::collections::{HashMap, HashSet};

use crate::domain::model::Action;
use crate::domain::names::sanitize;

const SHELL: &str = "shell";

/// Merge `specific` actions over `global` ones.
///
/// Names are compared after [`sanitize`]. A specific action replaces the global action it
/// collides with, in the global action's position. Specific actions with no global
/// counterpart are appended afterwards in their original order. Within either list the first
/// action of a sanitized name wins, so the result never holds two colliding names.
pub fn merge_actions(global: &[Action], specific: &[Action]) -> Vec<Action> {
    let mut overrides: HashMap<String, &Action> = HashMap::with_capacity(specific.len());
    for action in specific {
        overrides.entry(sanitize(&action.name)).or_insert(action);
    }

    let mut merged = Vec::with_capacity(global.len() + specific.len());
    let mut emitted: HashSet<String> = HashSet::new();

    for action in global {
        let key = sanitize(&action.name);
        if !emitted.insert(key.clone()) {
            continue;
        }
        match overrides.get(&key) {
            Some(replacement) => merged.push((*replacement).clone()),
            None => merged.push(action.clone()),
        }
    }

    for action in specific {
        if emitted.insert(sanitize(&action.name)) {
            merged.push(action.clone());
        }
    }

    merged
}

/// Ensure exactly one `shell` action exists and place it first when `shell_default` is set,
/// last otherwise. Applying this twice with the same flag is a no-op.
pub fn build_actions_with_shell(actions: &[Action], shell_default: bool) -> Vec<Action> {
    let mut shell = None;
    let mut rest = Vec::with_capacity(actions.len() + 1);

    for action in actions {
        if sanitize(&action.name) == SHELL {
            if shell.is_none() {
                shell = Some(action.clone());
            }
        } else {
            rest.push(action.clone());
        }
    }

    let shell = shell.unwrap_or_else(Action::shell);
    if shell_default {
        rest.insert(0, shell);
    } else {
        rest.push(shell);
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(actions: &[Action]) -> Vec<&str> {
        actions.iter().map(|action| action.name.as_str()).collect()
    }

    #[test]
    fn specific_overrides_global_in_place() {
        let global = vec![
            Action::new("build", "make"),
            Action::new("test", "make test"),
        ];
        let specific = vec![Action::new("Test", "cargo test"), Action::new("lint", "clippy")];

        let merged = merge_actions(&global, &specific);
        assert_eq!(names(&merged), ["build", "Test", "lint"]);
        assert_eq!(merged[1].command, "cargo test");
    }

    #[test]
    fn merge_with_empty_sides() {
        let global = vec![Action::new("build", "make")];
        assert_eq!(merge_actions(&global, &[]), global);
        assert_eq!(merge_actions(&[], &global), global);
        assert!(merge_actions(&[], &[]).is_empty());
    }

    #[test]
    fn merge_never_duplicates_sanitized_names() {
        let global = vec![Action::new("Run Tests", "make test")];
        let specific = vec![Action::new("run-tests", "cargo test")];
        let merged = merge_actions(&global, &specific);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].command, "cargo test");
    }

    #[test]
    fn first_colliding_action_wins_within_a_list() {
        let specific = vec![
            Action::new("Build", "make debug"),
            Action::new("build", "make release"),
        ];
        let alone = merge_actions(&[], &specific);
        assert_eq!(alone, vec![Action::new("Build", "make debug")]);

        let global = vec![Action::new("build", "make"), Action::new("BUILD", "make all")];
        let merged = merge_actions(&global, &specific);
        assert_eq!(merged, vec![Action::new("Build", "make debug")]);
    }

    #[test]
    fn synthesizes_shell_last_by_default() {
        let actions = vec![Action::new("build", "make")];
        let built = build_actions_with_shell(&actions, false);
        assert_eq!(names(&built), ["build", "shell"]);
        assert_eq!(built[1].command, "");
    }

    #[test]
    fn synthesizes_shell_first_when_default() {
        let actions = vec![Action::new("build", "make")];
        let built = build_actions_with_shell(&actions, true);
        assert_eq!(names(&built), ["shell", "build"]);
    }

    #[test]
    fn repositions_existing_shell_without_duplicating() {
        let actions = vec![
            Action::new("Shell", "zsh"),
            Action::new("build", "make"),
        ];
        let built = build_actions_with_shell(&actions, false);
        assert_eq!(names(&built), ["build", "Shell"]);
        assert_eq!(built[1].command, "zsh");
    }

    #[test]
    fn placement_is_idempotent() {
        let inputs = vec![
            vec![],
            vec![Action::new("build", "make")],
            vec![Action::new("shell", ""), Action::new("test", "go test")],
            vec![Action::new("a", "1"), Action::new("SHELL", "fish"), Action::new("b", "2")],
        ];
        for actions in inputs {
            for shell_default in [true, false] {
                let once = build_actions_with_shell(&actions, shell_default);
                let twice = build_actions_with_shell(&once, shell_default);
                assert_eq!(once, twice, "shell_default={shell_default} input={actions:?}");
            }
        }
    }

    #[test]
    fn empty_list_yields_only_shell() {
        assert_eq!(build_actions_with_shell(&[], true), vec![Action::shell()]);
    }
}
