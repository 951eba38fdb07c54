//! Case translation between the GraphQL convention (`SCREAMING_SNAKE_CASE`
//! enum values) and the internal `snake_case` convention used by the store,
//! the REST payloads and column names.

/// Convert `PER_UNIT`, `perUnit`, `PerUnit`, `per-unit` or `Per Unit` into `per_unit`.
pub fn to_snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev: Option<char> = None;

    for c in input.trim().chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev = Some('_');
            continue;
        }

        if c.is_uppercase() {
            // Word boundary only on lower->Upper or digit->Upper (camelCase), not inside ALL_CAPS runs
            let boundary = matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit());
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Convert `per_unit` (or `perUnit`) into `PER_UNIT`.
pub fn to_screaming_snake_case(input: &str) -> String {
    to_snake_case(input).to_ascii_uppercase()
}

/// Defines a string-backed enum stored and serialized in snake_case.
///
/// Parsing is lenient: any casing that [`to_snake_case`] normalizes to a
/// known value is accepted, so REST clients may send `PER_UNIT` as well.
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, async_graphql::Enum, utoipa::ToSchema)]
        #[schema(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = $crate::naming::to_snake_case(s);
                match normalized.as_str() {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(format!(
                        "invalid value '{}'; expected one of: {}",
                        s,
                        [$($value),+].join(", ")
                    )),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}
