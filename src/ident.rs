//! Identifier generation, validation, and content-derived identity.
//!
//! Test-case identifiers are dash-grouped 128-bit UUIDs. Three operations
//! cover the whole lifecycle:
//!
//! - [`new_id`] draws a fresh random (version 4) identifier. Collisions are
//!   cryptographically negligible; uniqueness is not otherwise enforced.
//! - [`is_valid_id`] is a pure structural check. It never consults
//!   uniqueness or prior existence.
//! - [`id_from_steps`] derives a stable (version 5) identifier from a
//!   case's step content, so identical steps always map to the identical
//!   id. The case name and description never contribute.
//!
//! ## Canonical step encoding
//!
//! Step rows are canonicalized with row order preserved and each row
//! rendered as a column-sorted map, then encoded as compact JSON. Empty
//! values participate, so a present-but-empty cell is distinguishable from
//! an absent column.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::{id_from_steps, is_valid_id, new_id, row, FlexTable, TestCase};
//!
//! assert!(is_valid_id(&new_id()));
//!
//! let case = TestCase::new("TestCase").with_steps(FlexTable::from(vec![
//!     row! {"A" => "B", "C" => "D"},
//!     row! {"E" => "F", "G" => "H"},
//! ]));
//! assert_eq!(id_from_steps(&case), "776f3506-aa08-568c-984f-c24098e216d6");
//! ```

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::case::TestCase;

/// Namespace for content-derived (version 5) identifiers.
const STEPS_ID_NAMESPACE: Uuid = Uuid::from_u128(0x78deb521_4602_5465_ad2c_58cbaf50cbcb);

/// Returns a freshly generated random identifier.
///
/// # Examples
///
/// ```rust
/// use tabcase::new_id;
///
/// assert_ne!(new_id(), new_id());
/// ```
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Checks whether a value is structurally a valid identifier: the
/// dash-grouped hex rendering of a 128-bit UUID.
///
/// # Examples
///
/// ```rust
/// use tabcase::is_valid_id;
///
/// assert!(is_valid_id("c5b52f89-d85e-48cc-b749-dd911b1e7526"));
/// assert!(!is_valid_id("not a valid id"));
/// assert!(!is_valid_id("c5b52f89d85e48ccb749dd911b1e7526"));
/// ```
#[must_use]
pub fn is_valid_id(value: &str) -> bool {
    // Only the hyphenated rendering is 36 characters long, so the length
    // check pins the dash grouping.
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

/// Derives the content-based identifier of a case from its step rows.
///
/// Deterministic in step content alone: equal step sequences (including
/// independent copies) yield equal ids, and any difference in cell values
/// or column membership yields a different id. Name and description are
/// excluded.
#[must_use]
pub fn id_from_steps(case: &TestCase) -> String {
    let canonical = Value::Array(
        case.steps
            .iter()
            .map(|row| {
                // serde_json's default map is BTreeMap-backed, which sorts
                // the columns of each row for us.
                Value::Object(
                    row.iter()
                        .map(|(column, value)| (column.clone(), Value::String(value.clone())))
                        .collect::<Map<String, Value>>(),
                )
            })
            .collect(),
    );
    Uuid::new_v5(&STEPS_ID_NAMESPACE, canonical.to_string().as_bytes()).to_string()
}
