//! Dense feed-forward regressor
//!
//! A small multilayer perceptron with ReLU hidden layers and a linear
//! output layer, fitted by mini-batch Adam on mean squared error. Weights
//! use Xavier/Glorot uniform initialisation drawn from the caller's random
//! source, so a seeded source gives a reproducible model.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hidden layer widths used by every category model
pub const DEFAULT_HIDDEN_LAYERS: [usize; 3] = [64, 32, 16];

/// Optimisation settings for one fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of samples, taken from the end of the batch, held out for validation
    pub validation_split: f64,
    pub learning_rate: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 1e-3,
        }
    }
}

/// Per-epoch loss (MSE) and MAE on the training and validation splits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitHistory {
    pub train_samples: usize,
    pub validation_samples: usize,
    pub train_loss: Vec<f64>,
    pub train_mae: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_mae: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    EmptyTrainingSet,
    ShapeMismatch { expected: usize, found: usize },
    Diverged { epoch: usize, loss: f64 },
}

#[derive(Debug, Clone)]
struct DenseLayer {
    inputs: usize,
    outputs: usize,
    /// Row-major `[outputs][inputs]`
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl DenseLayer {
    fn new<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
        }
    }

    fn forward(&self, input: &[f64], relu: bool) -> Vec<f64> {
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                let z = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + self.biases[o];
                if relu {
                    z.max(0.0)
                } else {
                    z
                }
            })
            .collect()
    }
}

/// Gradient buffers shaped like the network's parameters
struct Gradients {
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl Gradients {
    fn zeros(layers: &[DenseLayer]) -> Self {
        Self {
            weights: layers.iter().map(|l| vec![0.0; l.weights.len()]).collect(),
            biases: layers.iter().map(|l| vec![0.0; l.biases.len()]).collect(),
        }
    }

    fn reset(&mut self) {
        self.weights.iter_mut().for_each(|g| g.fill(0.0));
        self.biases.iter_mut().for_each(|g| g.fill(0.0));
    }
}

/// Adam optimiser state (β₁=0.9, β₂=0.999, ε=1e-7)
struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    m: Gradients,
    v: Gradients,
}

impl Adam {
    fn new(layers: &[DenseLayer], lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            t: 0,
            m: Gradients::zeros(layers),
            v: Gradients::zeros(layers),
        }
    }

    fn step(&mut self, layers: &mut [DenseLayer], grads: &Gradients) {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t);
        for (l, layer) in layers.iter_mut().enumerate() {
            Self::update(
                &mut layer.weights,
                &grads.weights[l],
                &mut self.m.weights[l],
                &mut self.v.weights[l],
                (self.lr, self.beta1, self.beta2, self.eps),
                (bias_correction1, bias_correction2),
            );
            Self::update(
                &mut layer.biases,
                &grads.biases[l],
                &mut self.m.biases[l],
                &mut self.v.biases[l],
                (self.lr, self.beta1, self.beta2, self.eps),
                (bias_correction1, bias_correction2),
            );
        }
    }

    fn update(
        params: &mut [f64],
        grads: &[f64],
        m: &mut [f64],
        v: &mut [f64],
        (lr, beta1, beta2, eps): (f64, f64, f64, f64),
        (bc1, bc2): (f64, f64),
    ) {
        for i in 0..params.len() {
            let g = grads[i];
            m[i] = beta1 * m[i] + (1.0 - beta1) * g;
            v[i] = beta2 * v[i] + (1.0 - beta2) * g * g;
            let m_hat = m[i] / bc1;
            let v_hat = v[i] / bc2;
            params[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }
}

/// Multilayer perceptron regressor
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
        rng: &mut R,
    ) -> Self {
        let widths: Vec<usize> = std::iter::once(inputs)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(outputs))
            .collect();
        let layers = widths
            .windows(2)
            .map(|w| DenseLayer::new(w[0], w[1], rng))
            .collect();
        Self { layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.inputs).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.outputs).unwrap_or(0)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    /// Inference forward pass
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let last = self.layers.len().saturating_sub(1);
        self.layers
            .iter()
            .enumerate()
            .fold(input.to_vec(), |x, (i, layer)| layer.forward(&x, i < last))
    }

    /// Forward pass keeping every layer's activation, input included
    fn forward_cached(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let last = self.layers.len().saturating_sub(1);
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        for (i, layer) in self.layers.iter().enumerate() {
            let next = layer.forward(&activations[i], i < last);
            activations.push(next);
        }
        activations
    }

    /// Accumulate the gradient of one sample given `d loss / d output`
    fn backward(&self, activations: &[Vec<f64>], output_delta: Vec<f64>, grads: &mut Gradients) {
        let mut delta = output_delta;
        for l in (0..self.layers.len()).rev() {
            let layer = &self.layers[l];
            let input = &activations[l];
            for o in 0..layer.outputs {
                let d = delta[o];
                grads.biases[l][o] += d;
                let row = &mut grads.weights[l][o * layer.inputs..(o + 1) * layer.inputs];
                for (g, x) in row.iter_mut().zip(input) {
                    *g += d * x;
                }
            }
            if l == 0 {
                break;
            }
            // `input` is the previous layer's post-ReLU activation
            delta = (0..layer.inputs)
                .map(|i| {
                    if input[i] <= 0.0 {
                        return 0.0;
                    }
                    (0..layer.outputs)
                        .map(|o| layer.weights[o * layer.inputs + i] * delta[o])
                        .sum()
                })
                .collect();
        }
    }

    /// Fit on normalised data, minimising mean squared error
    pub fn fit<X, Y, R>(
        &mut self,
        inputs: &[X],
        targets: &[Y],
        options: &FitOptions,
        rng: &mut R,
    ) -> Result<FitHistory, FitError>
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
        R: Rng + ?Sized,
    {
        if inputs.len() != targets.len() {
            return Err(FitError::ShapeMismatch {
                expected: inputs.len(),
                found: targets.len(),
            });
        }
        if let Some(bad) = inputs.iter().find(|x| x.as_ref().len() != self.input_size()) {
            return Err(FitError::ShapeMismatch {
                expected: self.input_size(),
                found: bad.as_ref().len(),
            });
        }
        if let Some(bad) = targets.iter().find(|y| y.as_ref().len() != self.output_size()) {
            return Err(FitError::ShapeMismatch {
                expected: self.output_size(),
                found: bad.as_ref().len(),
            });
        }

        let n = inputs.len();
        let split = options.validation_split.clamp(0.0, 1.0);
        let split_at = ((n as f64) * (1.0 - split)) as usize;
        if split_at == 0 {
            return Err(FitError::EmptyTrainingSet);
        }
        let batch_size = options.batch_size.max(1);

        let mut history = FitHistory {
            train_samples: split_at,
            validation_samples: n - split_at,
            ..FitHistory::default()
        };
        let mut optimizer = Adam::new(&self.layers, options.learning_rate);
        let mut grads = Gradients::zeros(&self.layers);
        let mut order: Vec<usize> = (0..split_at).collect();
        let outputs = self.output_size() as f64;

        for epoch in 0..options.epochs {
            order.shuffle(rng);
            let mut loss_sum = 0.0;
            let mut mae_sum = 0.0;

            for batch in order.chunks(batch_size) {
                grads.reset();
                let scale = 2.0 / (outputs * batch.len() as f64);
                for &idx in batch {
                    let activations = self.forward_cached(inputs[idx].as_ref());
                    let prediction = &activations[activations.len() - 1];
                    let target = targets[idx].as_ref();
                    let mut delta = Vec::with_capacity(prediction.len());
                    for (p, t) in prediction.iter().zip(target) {
                        let err = p - t;
                        loss_sum += err * err / outputs;
                        mae_sum += err.abs() / outputs;
                        delta.push(scale * err);
                    }
                    self.backward(&activations, delta, &mut grads);
                }
                optimizer.step(&mut self.layers, &grads);
            }

            let train_loss = loss_sum / split_at as f64;
            if !train_loss.is_finite() {
                return Err(FitError::Diverged {
                    epoch,
                    loss: train_loss,
                });
            }
            history.train_loss.push(train_loss);
            history.train_mae.push(mae_sum / split_at as f64);

            if split_at < n {
                let (val_loss, val_mae) = self.evaluate(&inputs[split_at..], &targets[split_at..]);
                history.val_loss.push(val_loss);
                history.val_mae.push(val_mae);
            }
            debug!(
                epoch = epoch + 1,
                train_loss = train_loss,
                val_loss = ?history.val_loss.last(),
                "Epoch finished"
            );
        }

        Ok(history)
    }

    /// Mean squared error and mean absolute error over a data set
    pub fn evaluate<X, Y>(&self, inputs: &[X], targets: &[Y]) -> (f64, f64)
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
    {
        let mut loss = 0.0;
        let mut mae = 0.0;
        let mut count = 0usize;
        for (x, y) in inputs.iter().zip(targets) {
            let prediction = self.forward(x.as_ref());
            for (p, t) in prediction.iter().zip(y.as_ref()) {
                let err = p - t;
                loss += err * err;
                mae += err.abs();
                count += 1;
            }
        }
        if count == 0 {
            return (0.0, 0.0);
        }
        (loss / count as f64, mae / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = DenseNetwork::new(6, &DEFAULT_HIDDEN_LAYERS, 4, &mut rng);
        assert_eq!(net.input_size(), 6);
        assert_eq!(net.output_size(), 4);
        assert_eq!(net.parameter_count(), 6 * 64 + 64 + 64 * 32 + 32 + 32 * 16 + 16 + 16 * 4 + 4);
        assert_eq!(net.forward(&[0.1; 6]).len(), 4);
    }

    #[test]
    fn test_seeded_init_reproducible() {
        let a = DenseNetwork::new(6, &[8], 4, &mut StdRng::seed_from_u64(42));
        let b = DenseNetwork::new(6, &[8], 4, &mut StdRng::seed_from_u64(42));
        let x = [0.3, -1.0, 0.5, 0.0, 1.2, -0.7];
        assert_eq!(a.forward(&x), b.forward(&x));
    }

    #[test]
    fn test_fit_learns_linear_map() {
        let mut rng = StdRng::seed_from_u64(9);
        let inputs: Vec<[f64; 2]> = (0..400)
            .map(|_| [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
            .collect();
        let targets: Vec<[f64; 1]> = inputs.iter().map(|x| [0.5 * x[0] - 0.25 * x[1]]).collect();

        let mut net = DenseNetwork::new(2, &[16], 1, &mut rng);
        let (initial, _) = net.evaluate(&inputs, &targets);
        let options = FitOptions {
            epochs: 40,
            batch_size: 16,
            validation_split: 0.2,
            learning_rate: 0.01,
        };
        let history = net.fit(&inputs, &targets, &options, &mut rng).unwrap();

        assert_eq!(history.train_samples, 320);
        assert_eq!(history.validation_samples, 80);
        assert_eq!(history.train_loss.len(), 40);
        assert_eq!(history.val_loss.len(), 40);
        let final_val = *history.val_loss.last().unwrap();
        assert!(final_val < initial * 0.1, "initial {} final {}", initial, final_val);
    }

    #[test]
    fn test_fit_rejects_mismatched_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = DenseNetwork::new(2, &[4], 1, &mut rng);
        let inputs = vec![[0.0; 3]; 10];
        let targets = vec![[0.0; 1]; 10];
        assert_eq!(
            net.fit(&inputs, &targets, &FitOptions::default(), &mut rng),
            Err(FitError::ShapeMismatch { expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_fit_requires_training_samples() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = DenseNetwork::new(1, &[4], 1, &mut rng);
        let inputs: Vec<[f64; 1]> = Vec::new();
        let targets: Vec<[f64; 1]> = Vec::new();
        assert_eq!(
            net.fit(&inputs, &targets, &FitOptions::default(), &mut rng),
            Err(FitError::EmptyTrainingSet)
        );
    }

    #[test]
    fn test_fit_reports_divergence() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut net = DenseNetwork::new(1, &[4], 1, &mut rng);
        let inputs = vec![[1.0]; 20];
        let targets = vec![[f64::INFINITY]; 20];
        let options = FitOptions {
            epochs: 3,
            ..FitOptions::default()
        };
        assert!(matches!(
            net.fit(&inputs, &targets, &options, &mut rng),
            Err(FitError::Diverged { epoch: 0, .. })
        ));
    }
}
