mod client;

pub use client::{ClassifierClient, ClassifyError, Prediction};
