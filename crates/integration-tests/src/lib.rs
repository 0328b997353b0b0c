//! End-to-end tests live under `tests/`; shared fixtures are in `tests/common`.
