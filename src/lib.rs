//! MooSelect: select herd records by typing a filter expression.
//!
//! ```text
//! 30 <= DIM <= 70 AND FCM > 30
//! EART != 20017, 20022
//! (30 <= DIM <= 70 AND FCM > 30) OR LAC = 3
//! ```
//!
//! Conditions compare a column with numbers (`>`, `<`, `>=`, `<=`, `=`,
//! `!=`), a range (`a <= col <= b`) or a comma-separated list, or test text
//! equality (`BREED = Jersey`). They combine with `AND` / `OR`. Boolean
//! columns are narrowed separately by include-true / include-blank toggles.

pub mod cli;
pub mod data;
pub mod filter;
pub mod state;
