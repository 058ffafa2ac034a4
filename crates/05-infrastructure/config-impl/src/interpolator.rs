//! 占位符解析器实现

use config_abstractions::StrLookup;
use infrastructure_common::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

/// 默认的最大嵌套解析深度
pub const DEFAULT_MAX_DEPTH: usize = 32;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^{}]+)\}").expect("占位符正则表达式无效"));

/// 字符串占位符解析器
///
/// 解析 `${name}` 形式的占位符。查找到的值会继续递归解析，
/// 通过解析栈检测循环引用，并以最大深度限制嵌套层数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringInterpolator {
    strict: bool,
    max_depth: usize,
}

impl StringInterpolator {
    /// 创建非严格模式的解析器
    pub fn new() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// 创建严格模式的解析器，无法解析的占位符将返回错误
    pub fn strict() -> Self {
        Self::new().with_strict(true)
    }

    /// 设置是否严格模式
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 设置最大嵌套深度
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// 是否严格模式
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// 解析模板中的占位符
    pub fn resolve(&self, template: &str, lookup: &dyn StrLookup) -> Result<String, ConfigError> {
        let mut stack = Vec::new();
        self.resolve_nested(template, lookup, &mut stack)
    }

    fn resolve_nested(
        &self,
        template: &str,
        lookup: &dyn StrLookup,
        stack: &mut Vec<String>,
    ) -> Result<String, ConfigError> {
        if !template.contains("${") {
            return Ok(template.to_string());
        }
        if stack.len() >= self.max_depth {
            return Err(ConfigError::InterpolationCycle {
                chain: stack.join(" -> "),
            });
        }

        let mut resolved = String::with_capacity(template.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            resolved.push_str(&template[last..whole.start()]);
            last = whole.end();

            let name = name.as_str();
            if stack.iter().any(|visited| visited == name) {
                let mut chain = stack.clone();
                chain.push(name.to_string());
                return Err(ConfigError::InterpolationCycle {
                    chain: chain.join(" -> "),
                });
            }

            match lookup.lookup(name) {
                Some(value) => {
                    stack.push(name.to_string());
                    let nested = self.resolve_nested(&value, lookup, stack)?;
                    stack.pop();
                    resolved.push_str(&nested);
                }
                None if self.strict => {
                    return Err(ConfigError::UnresolvedPlaceholder {
                        placeholder: name.to_string(),
                    });
                }
                None => resolved.push_str(whole.as_str()),
            }
        }
        resolved.push_str(&template[last..]);
        Ok(resolved)
    }
}

impl Default for StringInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_resolves_multiple_placeholders() {
        let lookup = lookup_from(&[("a", "x"), ("b", "y")]);
        let result = StringInterpolator::new().resolve("${a}-${b}", &lookup).unwrap();
        assert_eq!(result, "x-y");
    }

    #[test]
    fn test_missing_placeholder_stays_literal() {
        let lookup = lookup_from(&[]);
        let result = StringInterpolator::new()
            .resolve("value=${missing}", &lookup)
            .unwrap();
        assert_eq!(result, "value=${missing}");
    }

    #[test]
    fn test_strict_mode_rejects_missing() {
        let lookup = lookup_from(&[]);
        let error = StringInterpolator::strict()
            .resolve("${missing}", &lookup)
            .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::UnresolvedPlaceholder { placeholder } if placeholder == "missing"
        ));
    }

    #[test]
    fn test_nested_resolution() {
        let lookup = lookup_from(&[
            ("url", "http://${host}:${port}"),
            ("host", "${env}.example.com"),
            ("env", "prod"),
            ("port", "8080"),
        ]);
        let result = StringInterpolator::new().resolve("${url}/api", &lookup).unwrap();
        assert_eq!(result, "http://prod.example.com:8080/api");
    }

    #[test]
    fn test_cycle_is_detected() {
        let lookup = lookup_from(&[("a", "${b}"), ("b", "${a}")]);
        let error = StringInterpolator::new().resolve("${a}", &lookup).unwrap_err();
        match error {
            ConfigError::InterpolationCycle { chain } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_depth_bound() {
        let lookup = lookup_from(&[("a", "${b}"), ("b", "${c}"), ("c", "done")]);
        let shallow = StringInterpolator::new().with_max_depth(2);
        assert!(matches!(
            shallow.resolve("${a}", &lookup),
            Err(ConfigError::InterpolationCycle { .. })
        ));
        assert_eq!(
            StringInterpolator::new().resolve("${a}", &lookup).unwrap(),
            "done"
        );
    }

    #[test]
    fn test_same_placeholder_twice_is_not_a_cycle() {
        let lookup = lookup_from(&[("a", "x")]);
        let result = StringInterpolator::strict().resolve("${a}${a}", &lookup).unwrap();
        assert_eq!(result, "xx");
    }
}
