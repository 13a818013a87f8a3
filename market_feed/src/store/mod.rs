//! UI-facing state written by tick delivery and read by presentation code.
//!
//! - `quote_store`: latest quote per instrument, merged field by field.
//! - `window_buffer`: bounded tick history for the observed instrument.
//!
//! Both are internally synchronized and hand out copies, never live views.

pub mod quote_store;
pub mod window_buffer;
