use parking_lot::Mutex;
use tch::{Device, Kind, Tensor, no_grad};
use tokenizers::Tokenizer;

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{DeviceReport, ModelReport, TextGenerator},
};

const GPT2_EOS_TOKEN_ID: i64 = 50256;

/// Text-generation pipeline backed by a TorchScript-exported causal LM.
///
/// Loaded once at startup and shared for the process lifetime. The traced
/// module is not safe for concurrent forward passes, so it sits behind a
/// mutex and requests serialize on it.
pub struct TextGenerationPipeline {
    tokenizer: Tokenizer,
    module: Mutex<tch::CModule>,
    device: Device,
    eos_token_id: i64,
    max_new_tokens: usize,
    temperature: f64,
}

impl TextGenerationPipeline {
    pub fn load(config: &AppConfig) -> Result<Self, ServiceError> {
        let tokenizer = Tokenizer::from_file(config.tokenizer_path.as_path())
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))?;

        if !config.module_path.exists() {
            return Err(ServiceError::Other(format!(
                "model artifact missing: {}",
                config.module_path.display()
            )));
        }
        let mut module = tch::CModule::load_on_device(config.module_path.as_path(), config.device)
            .map_err(|e| ServiceError::Pipeline(e.to_string()))?;
        module.set_eval();

        let eos_token_id = tokenizer
            .token_to_id("<|endoftext|>")
            .map(i64::from)
            .unwrap_or(GPT2_EOS_TOKEN_ID);

        Ok(Self {
            tokenizer,
            module: Mutex::new(module),
            device: config.device,
            eos_token_id,
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
        })
    }

    fn forward_logits(module: &tch::CModule, input: Tensor) -> Result<Tensor, ServiceError> {
        let output = module
            .forward_is(&[tch::IValue::Tensor(input)])
            .map_err(|e| ServiceError::Pipeline(e.to_string()))?;

        // Traced GPT-2 returns either the logits tensor or (logits, past).
        match output {
            tch::IValue::Tensor(t) => Ok(t),
            tch::IValue::Tuple(ref tuple) if !tuple.is_empty() => match &tuple[0] {
                tch::IValue::Tensor(t) => Ok(t.shallow_clone()),
                _ => Err(ServiceError::Pipeline(
                    "expected tensor as first tuple element".into(),
                )),
            },
            _ => Err(ServiceError::Pipeline(
                "unexpected model output format".into(),
            )),
        }
    }

    fn sample_next(&self, last_logits: &Tensor) -> i64 {
        if self.temperature > 0.0 {
            let probs = (last_logits / self.temperature).softmax(-1, Kind::Float);
            probs.multinomial(1, true).int64_value(&[0])
        } else {
            last_logits.argmax(0, false).int64_value(&[])
        }
    }
}

impl TextGenerator for TextGenerationPipeline {
    fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))?;
        let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        // Empty prompts are allowed; seed the sequence with EOS so the
        // forward pass has at least one position to condition on.
        if input_ids.is_empty() {
            input_ids.push(self.eos_token_id);
        }

        no_grad(|| {
            let module = self.module.lock();

            for _ in 0..self.max_new_tokens {
                let input_tensor = Tensor::from_slice(&input_ids)
                    .reshape([1, input_ids.len() as i64])
                    .to(self.device);

                let logits = Self::forward_logits(&module, input_tensor)?;

                // Logits shape [1, seq_len, vocab_size]; keep the last position.
                let last_logits = logits.select(1, -1).squeeze();

                let next_token_id = self.sample_next(&last_logits);
                input_ids.push(next_token_id);

                if next_token_id == self.eos_token_id {
                    break;
                }
            }

            Ok::<(), ServiceError>(())
        })?;

        // Decode the full sequence so the prompt is echoed in the output,
        // matching the text-generation pipeline convention.
        let all_ids: Vec<u32> = input_ids.iter().map(|&id| id as u32).collect();
        self.tokenizer
            .decode(&all_ids, true)
            .map_err(|e| ServiceError::Tokenizer(e.to_string()))
    }

    fn device_report(&self) -> DeviceReport {
        let cuda_available = tch::Cuda::is_available();
        let device = match self.device {
            Device::Cpu => "cpu".to_string(),
            Device::Cuda(idx) => format!("cuda:{idx}"),
            other => format!("{other:?}").to_lowercase(),
        };

        // libtorch's Rust bindings expose availability but not the adapter
        // name, driver version, or per-device memory counters, so those stay
        // unset and the status layer substitutes its sentinels.
        let gpu_name = match self.device {
            Device::Cuda(idx) if cuda_available => Some(format!("CUDA device {idx}")),
            _ => None,
        };

        DeviceReport {
            device,
            cuda_available,
            gpu_name,
            cuda_version: None,
            gpu_total_gb: None,
            gpu_allocated_gb: None,
        }
    }

    fn model_report(&self) -> ModelReport {
        ModelReport {
            vocab_size: self.tokenizer.get_vocab_size(true),
            accelerated: matches!(self.device, Device::Cuda(_)),
        }
    }
}
