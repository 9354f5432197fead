// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of the system: interactions, datasets, epoch metrics and the
// abstractions other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Column-wise interaction lists and the loaded dataset
pub mod interaction;

// Epoch metrics and best-model bookkeeping
pub mod progress;

// Core abstractions (traits) that other layers implement
pub mod traits;
