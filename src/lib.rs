//! po-catalog
//!
//! gettext PO カタログのパーサ・バリデータ・シリアライザ。
//! Parses documentation translation catalogs, validates their
//! content-integrity invariants and writes them back in canonical form.

pub mod catalog;
pub mod check;
pub mod plural;
pub mod scan;
pub mod syntax;
pub mod types;
pub mod writer;

// 主要な型を再エクスポート
pub use catalog::{Catalog, Entry, Header, HeaderComments};
pub use check::{CheckSettings, Diagnostic, Severity, check_catalog};
pub use plural::PluralForms;
pub use syntax::parser::ParseError;
