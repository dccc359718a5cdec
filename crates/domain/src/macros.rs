//! Display/FromStr generation for the lowercase status enums stored in the
//! backend (`status`, `billingCycle`).
//!
//! # Example
//!
//! ```rust
//! use homedash_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Shelf {
//!     Pantry,
//!     Fridge,
//! }
//!
//! impl_domain_status_conversions!(Shelf {
//!     Pantry => "pantry",
//!     Fridge => "fridge",
//! });
//!
//! assert_eq!("FRIDGE".parse::<Shelf>(), Ok(Shelf::Fridge));
//! ```

/// Implements `Display` (wire string) and case-insensitive `FromStr` for a
/// fieldless enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation of the variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::std::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
