//! Cross-crate scenarios for the forge engine and its policy loader. The
//! tests live under `tests/`.
