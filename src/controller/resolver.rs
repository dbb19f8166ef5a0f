//! Turns `"Controller:action"` strings into fully-qualified names.
//!
//! With `controller.prefix = "\App\"` and `controller.suffix = "Controller"`,
//! `"Auth:login"` resolves to `\App\AuthController` / `login`, while the
//! absolute form `"\Auth:login"` skips the prefix and resolves to
//! `\AuthController` / `login`. A dot in the class segment stands for the
//! namespace separator, so `"Admin.Users:list"` becomes
//! `\App\Admin\UsersController`.

use super::ControllerHandler;
use crate::config::ControllerConfig;
use crate::error::RouteError;
use serde_json::Value;

pub const NAMESPACE_SEPARATOR: char = '\\';
pub const DEFAULT_ACTION: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub class: String,
    pub action: String,
}

#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    config: ControllerConfig,
}

impl NameResolver {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn resolve_name(&self, spec: &str) -> Result<ResolvedName, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        if spec.trim().is_empty() {
            return Err(invalid("route target is empty"));
        }

        let (class, action) = spec.split_once(':').unwrap_or((spec, ""));
        if class.trim_start_matches(NAMESPACE_SEPARATOR).is_empty() {
            return Err(invalid("controller name is missing"));
        }

        let action = if action.is_empty() { DEFAULT_ACTION } else { action };
        let action = format!(
            "{}{}{}",
            self.config.action_prefix, action, self.config.action_suffix
        );

        let mut class = if class.starts_with(NAMESPACE_SEPARATOR) {
            class.to_string()
        } else {
            format!("{}{}", self.config.prefix, class)
        };
        class.push_str(&self.config.suffix);
        let class = class.replace('.', &NAMESPACE_SEPARATOR.to_string());

        Ok(ResolvedName { class, action })
    }

    /// Resolves `spec` eagerly; the controller itself is looked up and
    /// constructed only when the returned handler is called.
    pub fn resolve(&self, spec: &str, args: Vec<Value>) -> Result<ControllerHandler, RouteError> {
        let ResolvedName { class, action } = self.resolve_name(spec)?;
        tracing::trace!(spec, class = %class, action = %action, "Resolved controller target");
        Ok(ControllerHandler::new(class, action, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(prefix: &str, suffix: &str, action_prefix: &str, action_suffix: &str) -> NameResolver {
        NameResolver::new(ControllerConfig {
            prefix: prefix.into(),
            suffix: suffix.into(),
            action_prefix: action_prefix.into(),
            action_suffix: action_suffix.into(),
        })
    }

    fn name(class: &str, action: &str) -> ResolvedName {
        ResolvedName {
            class: class.into(),
            action: action.into(),
        }
    }

    #[test]
    fn applies_prefix_and_suffix() {
        let resolver = resolver("\\P", "Controller", "", "");
        for (class, action) in [("Foo", "bar"), ("Greeter", "hi"), ("A", "b")] {
            let spec = format!("{}:{}", class, action);
            assert_eq!(
                resolver.resolve_name(&spec).unwrap(),
                name(&format!("\\P{}Controller", class), action)
            );
        }
    }

    #[test]
    fn absolute_classes_skip_the_prefix() {
        for prefix in ["", "\\P", "\\App\\Controllers\\"] {
            let resolver = resolver(prefix, "Controller", "", "");
            assert_eq!(
                resolver.resolve_name("\\Foo:bar").unwrap(),
                name("\\FooController", "bar")
            );
        }
    }

    #[test]
    fn action_defaults_to_index_before_affixes() {
        let resolver = resolver("", "", "do_", "Action");
        assert_eq!(resolver.resolve_name("Home").unwrap(), name("Home", "do_indexAction"));
        assert_eq!(resolver.resolve_name("Home:").unwrap(), name("Home", "do_indexAction"));
        assert_eq!(resolver.resolve_name("Home:show").unwrap(), name("Home", "do_showAction"));
    }

    #[test]
    fn dots_become_namespace_separators() {
        let resolver = resolver("\\App\\", "Controller", "", "");
        assert_eq!(
            resolver.resolve_name("Admin.Users:list").unwrap(),
            name("\\App\\Admin\\UsersController", "list")
        );
        assert_eq!(
            resolver.resolve_name("\\Vendor.Blog.Post").unwrap(),
            name("\\Vendor\\Blog\\PostController", "index")
        );
    }

    #[test]
    fn splits_on_the_first_colon_only() {
        let resolver = NameResolver::default();
        assert_eq!(resolver.resolve_name("A:b:c").unwrap(), name("A", "b:c"));
    }

    #[test]
    fn rejects_malformed_targets() {
        let resolver = NameResolver::default();
        for spec in ["", "   ", ":index", "\\:index"] {
            let err = resolver.resolve_name(spec).unwrap_err();
            assert!(matches!(err, RouteError::InvalidSpec { .. }), "{:?}", spec);
        }
    }

    #[test]
    fn resolve_captures_names_and_arguments() {
        let handler = resolver("", "Controller", "", "")
            .resolve("Greeter:hi", vec![Value::from("en")])
            .unwrap();
        assert_eq!(handler.class(), "GreeterController");
        assert_eq!(handler.action(), "hi");
        assert_eq!(handler.args(), [Value::from("en")]);
    }

    #[test]
    fn class_names_are_taken_verbatim() {
        let resolver = resolver("", "Controller", "", "");
        assert_eq!(
            resolver.resolve_name("Odd Name:go").unwrap(),
            name("Odd NameController", "go")
        );
    }
}
