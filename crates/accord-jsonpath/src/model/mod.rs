//! Body model: resolved value trees, dual-valued contract bodies and matchers.

mod body;
mod matcher;
mod value;

pub use body::{ContractBody, Side};
pub use matcher::{Matcher, MatchingType, ISO_DATE, ISO_DATE_TIME, ISO_TIME};
pub use value::{Interpolated, InterpolatedPart, ObjectMap, Scalar, ValueNode};
