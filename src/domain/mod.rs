// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe what the
// system works with: labelled news records, their tokenized
// form, per-class predictions, and the error kinds the data
// pipeline can raise.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Raw and remapped records, tokenized records, predictions
pub mod record;

// Typed pipeline failures (label range, split config, report input)
pub mod error;

// Capability traits implemented by the data, ml and infra layers
pub mod traits;
