//! 类型解码
//!
//! 将 [`RawValue`] 显式转换为目标类型：字符串通过 [`Decode::decode`] 解析，
//! 其他原生值通过 [`Decode::from_native`] 按类型匹配，不做跨类型强转。

use crate::value::RawValue;
use infrastructure_common::ConfigError;

/// 可从配置值解码的类型
pub trait Decode: Sized + Clone + PartialEq + Send + Sync + 'static {
    /// 类型名称，用于错误信息
    const TYPE_NAME: &'static str;

    /// 与目标类型严格对应的原生值类型，取值同 [`RawValue::type_name`]
    const NATIVE_KIND: &'static str;

    /// 从（已完成占位符解析的）字符串解码
    fn decode(text: &str) -> Result<Self, ConfigError>;

    /// 从非字符串的原生值转换
    fn from_native(raw: &RawValue) -> Result<Self, ConfigError>;
}

/// 严格转换单个列表元素：字符串经解码，原生值必须与目标类型严格对应
pub fn decode_element<T: Decode>(
    raw: &RawValue,
    decode_string: impl FnOnce(&str) -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    match raw {
        RawValue::String(text) => decode_string(text),
        native if native.type_name() == T::NATIVE_KIND => T::from_native(native),
        other => Err(unsupported::<T>(other)),
    }
}

fn unsupported<T: Decode>(raw: &RawValue) -> ConfigError {
    ConfigError::UnsupportedValueType {
        expected: T::TYPE_NAME,
        actual: raw.type_name(),
    }
}

impl Decode for String {
    const TYPE_NAME: &'static str = "string";
    const NATIVE_KIND: &'static str = "string";

    fn decode(text: &str) -> Result<Self, ConfigError> {
        Ok(text.to_string())
    }

    fn from_native(raw: &RawValue) -> Result<Self, ConfigError> {
        match raw {
            RawValue::List(_) => Err(unsupported::<Self>(raw)),
            scalar => Ok(scalar.to_string()),
        }
    }
}

impl Decode for bool {
    const TYPE_NAME: &'static str = "bool";
    const NATIVE_KIND: &'static str = "boolean";

    fn decode(text: &str) -> Result<Self, ConfigError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::conversion(format!("无法将 '{other}' 解析为 bool"))),
        }
    }

    fn from_native(raw: &RawValue) -> Result<Self, ConfigError> {
        match raw {
            RawValue::Boolean(b) => Ok(*b),
            _ => Err(unsupported::<Self>(raw)),
        }
    }
}

macro_rules! decode_integer {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                const NATIVE_KIND: &'static str = "integer";

                fn decode(text: &str) -> Result<Self, ConfigError> {
                    text.trim().parse::<$ty>().map_err(|e| {
                        ConfigError::conversion(format!(
                            "无法将 '{}' 解析为 {}: {}",
                            text,
                            stringify!($ty),
                            e
                        ))
                    })
                }

                fn from_native(raw: &RawValue) -> Result<Self, ConfigError> {
                    match raw {
                        RawValue::Integer(i) => <$ty>::try_from(*i).map_err(|_| {
                            ConfigError::conversion(format!(
                                "{} 超出 {} 的取值范围",
                                i,
                                stringify!($ty)
                            ))
                        }),
                        _ => Err(unsupported::<Self>(raw)),
                    }
                }
            }
        )*
    };
}

decode_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! decode_float {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                const NATIVE_KIND: &'static str = "float";

                fn decode(text: &str) -> Result<Self, ConfigError> {
                    text.trim().parse::<$ty>().map_err(|e| {
                        ConfigError::conversion(format!(
                            "无法将 '{}' 解析为 {}: {}",
                            text,
                            stringify!($ty),
                            e
                        ))
                    })
                }

                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                fn from_native(raw: &RawValue) -> Result<Self, ConfigError> {
                    match raw {
                        RawValue::Float(f) => Ok(*f as $ty),
                        RawValue::Integer(i) => Ok(*i as $ty),
                        _ => Err(unsupported::<Self>(raw)),
                    }
                }
            }
        )*
    };
}

decode_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_decoding() {
        assert_eq!(i32::decode(" 42 ").unwrap(), 42);
        assert!(matches!(
            i32::decode("forty-two"),
            Err(ConfigError::TypeConversionError { .. })
        ));
        assert_eq!(u16::from_native(&RawValue::Integer(8080)).unwrap(), 8080);
        assert!(matches!(
            u8::from_native(&RawValue::Integer(300)),
            Err(ConfigError::TypeConversionError { .. })
        ));
    }

    #[test]
    fn test_native_mismatch_is_unsupported() {
        let error = i64::from_native(&RawValue::Boolean(true)).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::UnsupportedValueType {
                expected: "i64",
                actual: "boolean"
            }
        ));
        assert!(matches!(
            String::from_native(&RawValue::List(vec![])),
            Err(ConfigError::UnsupportedValueType { .. })
        ));
    }

    #[test]
    fn test_bool_and_string_natives() {
        assert!(bool::decode("Yes").unwrap());
        assert!(!bool::from_native(&RawValue::Boolean(false)).unwrap());
        assert_eq!(String::from_native(&RawValue::Integer(5)).unwrap(), "5");
        assert!((f64::from_native(&RawValue::Integer(2)).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_list_elements_require_exact_native_kind() {
        assert_eq!(
            decode_element::<String>(&RawValue::from("a"), String::decode).unwrap(),
            "a"
        );
        assert!(matches!(
            decode_element::<String>(&RawValue::Integer(1), String::decode),
            Err(ConfigError::UnsupportedValueType {
                expected: "string",
                actual: "integer"
            })
        ));
        assert!(matches!(
            decode_element::<f64>(&RawValue::Integer(1), f64::decode),
            Err(ConfigError::UnsupportedValueType { .. })
        ));
        assert_eq!(
            decode_element::<i64>(&RawValue::Integer(7), i64::decode).unwrap(),
            7
        );
    }
}
