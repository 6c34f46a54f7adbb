//! Post-compile usage checks.

use std::fmt;

use crate::resolve::{MixinRegistry, ScopeStack};

/// An advisory finding about the compiled sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A mixin included fewer than twice.
    UnderusedMixin { name: String, used: u32 },
    /// A parameterless mixin only ever included from one file other than
    /// the one defining it.
    SingleFileMixin {
        name: String,
        used_in: Option<String>,
        defined_in: Option<String>,
    },
    /// A global variable that was never read.
    UnusedVariable { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnderusedMixin { name, used } => {
                write!(f, "Usage count of mixin: {} is only: {}", name, used)
            }
            Diagnostic::SingleFileMixin {
                name,
                used_in,
                defined_in,
            } => write!(
                f,
                "Mixin: {} is used only in one file: {}  {}",
                name,
                used_in.as_deref().unwrap_or(""),
                defined_in.as_deref().unwrap_or("")
            ),
            Diagnostic::UnusedVariable { name } => write!(f, "Unused variable: {}", name),
        }
    }
}

/// Check mixin and variable usage.
///
/// A mixin is under-used when it was included fewer than twice, unless its
/// single use was in the file defining it. Otherwise a parameterless mixin
/// whose uses all came from one file, not its own, is reported as a
/// single-file mixin. Global variables nobody read are reported as unused.
pub fn check(mixins: &MixinRegistry, scopes: &ScopeStack) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for mixin in mixins.iter() {
        let first_use_elsewhere = mixin.first_used_file != mixin.file;
        if mixin.used_count < 2 && (mixin.used_count == 0 || first_use_elsewhere) {
            diagnostics.push(Diagnostic::UnderusedMixin {
                name: mixin.name.clone(),
                used: mixin.used_count,
            });
        } else if mixin.used_in_one_file && mixin.parameters.is_empty() && first_use_elsewhere {
            diagnostics.push(Diagnostic::SingleFileMixin {
                name: mixin.name.clone(),
                used_in: mixin.first_used_file.clone(),
                defined_in: mixin.file.clone(),
            });
        }
    }

    for cell in scopes.unused() {
        diagnostics.push(Diagnostic::UnusedVariable {
            name: cell.name.clone(),
        });
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Mixin;

    fn mixin(name: &str, parameters: &[&str], file: &str) -> Mixin {
        Mixin::new(
            name,
            parameters.iter().map(|p| p.to_string()).collect(),
            "x: 1;",
            Some(file.to_string()),
            1,
        )
    }

    fn include(mixins: &mut MixinRegistry, name: &str, file: &str) {
        let mut scopes = ScopeStack::new();
        let args: Vec<String> = mixins
            .get(name)
            .map(|m| m.parameters.iter().map(|_| "1".to_string()).collect())
            .unwrap_or_default();
        mixins.include(name, &args, Some(file), &mut scopes).unwrap();
    }

    #[test]
    fn unused_mixin_is_underused() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &[], "lib.scss")).unwrap();

        let found = check(&mixins, &ScopeStack::new());
        assert_eq!(
            found,
            vec![Diagnostic::UnderusedMixin {
                name: "m".into(),
                used: 0
            }]
        );
        assert_eq!(found[0].to_string(), "Usage count of mixin: m is only: 0");
    }

    #[test]
    fn single_use_in_defining_file_is_fine() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &[], "lib.scss")).unwrap();
        include(&mut mixins, "m", "lib.scss");

        assert!(check(&mixins, &ScopeStack::new()).is_empty());
    }

    #[test]
    fn single_use_elsewhere_is_underused() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &["a"], "lib.scss")).unwrap();
        include(&mut mixins, "m", "main.scss");

        assert!(matches!(
            check(&mixins, &ScopeStack::new()).as_slice(),
            [Diagnostic::UnderusedMixin { used: 1, .. }]
        ));
    }

    #[test]
    fn parameterless_mixin_used_from_one_other_file() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &[], "lib.scss")).unwrap();
        include(&mut mixins, "m", "main.scss");
        include(&mut mixins, "m", "main.scss");

        let found = check(&mixins, &ScopeStack::new());
        assert_eq!(
            found[0].to_string(),
            "Mixin: m is used only in one file: main.scss  lib.scss"
        );
    }

    #[test]
    fn mixin_with_parameters_may_stay_in_one_file() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &["a"], "lib.scss")).unwrap();
        include(&mut mixins, "m", "main.scss");
        include(&mut mixins, "m", "main.scss");

        assert!(check(&mixins, &ScopeStack::new()).is_empty());
    }

    #[test]
    fn mixin_used_from_two_files_is_fine() {
        let mut mixins = MixinRegistry::new();
        mixins.define(mixin("m", &[], "lib.scss")).unwrap();
        include(&mut mixins, "m", "a.scss");
        include(&mut mixins, "m", "b.scss");

        assert!(check(&mixins, &ScopeStack::new()).is_empty());
    }

    #[test]
    fn unused_variables() {
        let mut scopes = ScopeStack::new();
        scopes.define("used", "1", false);
        scopes.define("idle", "2", false);
        scopes.resolve("used").unwrap();

        assert_eq!(
            check(&MixinRegistry::new(), &scopes),
            vec![Diagnostic::UnusedVariable {
                name: "idle".into()
            }]
        );
    }
}
