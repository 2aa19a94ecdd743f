//! Pipeline stages for document-to-spreadsheet conversion.
//!
//! Each submodule implements one step and can be used and tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ validate ──▶ table ──▶ sheet
//! (file)    (pdf/ocr)   (JSON)  (serde_json)  (flatten)  (xlsx)
//! ```
//!
//! 1. [`input`]    — read a local file and declare its media type
//! 2. [`extract`]  — pick a strategy by media type; [`pdf`] and [`ocr`] do
//!    the blocking work
//! 3. [`llm`]      — one bounded call to the text-generation service; the
//!    only stage with network I/O
//! 4. [`validate`] — parse the reply as JSON, strictly by default
//! 5. [`table`]    — [`flatten`] each record and union the columns
//! 6. [`sheet`]    — serialise the table to xlsx bytes

pub mod extract;
pub mod flatten;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod pdf;
pub mod sheet;
pub mod table;
pub mod validate;
