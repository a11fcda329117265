use serde::{Deserialize, Serialize};

use std::f64::consts::PI;

/// An ActivationType represents the type
/// of activation function a neuron uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    // 1 / (1 + exp(-x))
    Sigmoid,
    // tanh(x)
    Tanh,
    // max(x, 0)
    ReLU,
    // x
    Identity,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sinusoidal,
    // 1 if x > 0, else 0
    Step,
}

/// An activation function, applied to the
/// response-scaled sum of a neuron's inputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivationFunction {
    pub kind: ActivationType,
    /// Steepness of the function: it is evaluated
    /// at `response · x`.
    pub response: f64,
}

impl ActivationFunction {
    /// Response of the steepened sigmoid of the NEAT paper.
    pub const SIGMOID_RESPONSE: f64 = 4.9;

    pub fn new(kind: ActivationType, response: f64) -> ActivationFunction {
        ActivationFunction { kind, response }
    }

    /// `1 / (1 + exp(-4.9x))`.
    pub fn sigmoid() -> ActivationFunction {
        Self::new(ActivationType::Sigmoid, Self::SIGMOID_RESPONSE)
    }

    /// `x`, unscaled.
    pub fn identity() -> ActivationFunction {
        Self::new(ActivationType::Identity, 1.0)
    }

    /// Evaluates the function at `x`. The result is never
    /// NaN: NaN results fall back to the sigmoid function,
    /// and from there to 0.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{ActivationFunction, ActivationType};
    ///
    /// let relu = ActivationFunction::new(ActivationType::ReLU, 2.0);
    /// assert_eq!(relu.apply(1.5), 3.0);
    /// assert_eq!(relu.apply(-1.5), 0.0);
    ///
    /// assert_eq!(ActivationFunction::sigmoid().apply(0.0), 0.5);
    /// assert_eq!(ActivationFunction::sigmoid().apply(f64::NAN), 0.0);
    /// ```
    pub fn apply(&self, x: f64) -> f64 {
        let x = self.response * x;
        let y = match self.kind {
            ActivationType::Sigmoid => sigmoid(x),
            ActivationType::Tanh => x.tanh(),
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Identity => x,
            ActivationType::Gaussian => (-x * x).exp(),
            ActivationType::Sinusoidal => (PI * x).sin(),
            ActivationType::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        };
        if !y.is_nan() {
            y
        } else {
            let fallback = sigmoid(x);
            if fallback.is_nan() {
                0.0
            } else {
                fallback
            }
        }
    }
}

impl Default for ActivationFunction {
    fn default() -> Self {
        Self::sigmoid()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
