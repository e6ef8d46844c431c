// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per use case: train, evaluate, or predict.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Stage-to-stage workflow over the domain traits
pub mod pipeline;

// The training workflow
pub mod train_use_case;

// Scoring a saved model on labelled data
pub mod evaluate_use_case;

// Classifying free text with a saved model
pub mod predict_use_case;
