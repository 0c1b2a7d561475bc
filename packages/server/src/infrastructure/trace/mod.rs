//! `TraceService` implementations.

pub mod python_tutor;

pub use python_tutor::PythonTutorClient;
