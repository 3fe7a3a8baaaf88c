//! Shared ONNX Runtime model adapter.
//!
//! Every stage of the pipeline is the same three steps: load a model file
//! for a target device, feed it named tensors, and read named tensors back.
//! [`OnnxModel`] owns the session and does those steps; the stage modules
//! only know about their own tensor layouts.

use crate::{Error, Result};
use ndarray::{ArrayD, CowArray};
use ort::{
    execution_providers::{CPUExecutionProviderOptions, CUDAExecutionProviderOptions, OpenVINOExecutionProviderOptions},
    Environment, ExecutionProvider, GraphOptimizationLevel, LoggingLevel, Session, SessionBuilder, Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Target device for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Device {
    /// Plain CPU execution
    #[default]
    Cpu,
    /// CUDA GPU
    Gpu,
    /// Intel Neural Compute Stick via the OpenVINO provider
    Myriad,
    /// OpenVINO heterogeneous plugin
    Hetero,
}

impl Device {
    /// Execution providers registered for this device, in priority order.
    ///
    /// CPU is always appended so a missing accelerator degrades instead of failing.
    fn execution_providers(self) -> Vec<ExecutionProvider> {
        let cpu = ExecutionProvider::CPU(CPUExecutionProviderOptions::default());
        match self {
            Self::Cpu => vec![cpu],
            Self::Gpu => vec![ExecutionProvider::CUDA(CUDAExecutionProviderOptions::default()), cpu],
            Self::Myriad | Self::Hetero => {
                vec![ExecutionProvider::OpenVINO(OpenVINOExecutionProviderOptions::default()), cpu]
            }
        }
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "CPU" => Ok(Self::Cpu),
            "GPU" | "CUDA" => Ok(Self::Gpu),
            "MYRIAD" => Ok(Self::Myriad),
            "HETERO" => Ok(Self::Hetero),
            other => Err(Error::ConfigError(format!(
                "Unknown device {other}, expected CPU, GPU, MYRIAD or HETERO"
            ))),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Myriad => "MYRIAD",
            Self::Hetero => "HETERO",
        };
        f.write_str(name)
    }
}

/// Tensors a pipeline stage expects a model to expose
#[derive(Debug, Clone, Copy)]
pub struct ModelSignature {
    /// Number of inputs the stage feeds
    pub input_count: usize,
    /// Inputs the stage feeds by name
    pub named_inputs: &'static [&'static str],
    /// Outputs the stage reads by name
    pub named_outputs: &'static [&'static str],
}

/// One output tensor copied out of the session
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Tensor name as declared by the model
    pub name: String,
    /// Tensor shape
    pub shape: Vec<usize>,
    /// Row-major tensor data
    pub data: Vec<f32>,
}

/// Find an output by name
///
/// # Errors
///
/// Returns an error if no output carries that name
pub fn find_output<'a>(outputs: &'a [ModelOutput], name: &str) -> Result<&'a ModelOutput> {
    outputs
        .iter()
        .find(|output| output.name == name)
        .ok_or_else(|| Error::ModelOutputError(format!("Model produced no output named {name}")))
}

/// A loaded ONNX model bound to a device
pub struct OnnxModel {
    name: String,
    session: Session,
    load_time: Duration,
}

impl OnnxModel {
    /// Load a model file onto a device
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model file does not exist
    /// - The ONNX runtime environment cannot be created
    /// - The session cannot be built from the file
    pub fn load<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(Error::ModelError(format!("Model file not found: {}", path.display())));
        }

        let name = path
            .file_stem()
            .map_or_else(|| "model".to_string(), |stem| stem.to_string_lossy().into_owned());
        log::debug!("Loading {} on {}", path.display(), device);

        let started = Instant::now();
        let environment = Arc::new(
            Environment::builder()
                .with_name(name.clone())
                .with_log_level(LoggingLevel::Warning)
                .build()?,
        );

        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(device.execution_providers())?
            .with_model_from_file(path)?;
        let load_time = started.elapsed();

        Ok(Self {
            name,
            session,
            load_time,
        })
    }

    /// Wall time spent loading the model
    #[must_use]
    pub const fn load_time(&self) -> Duration {
        self.load_time
    }

    /// Verify the model exposes what the stage drives
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedModel`] listing every missing tensor
    pub fn check_model(&self, signature: &ModelSignature) -> Result<()> {
        let inputs: Vec<String> = self.session.inputs.iter().map(|i| i.name.clone()).collect();
        let outputs: Vec<String> = self.session.outputs.iter().map(|o| o.name.clone()).collect();
        check_signature(&self.name, signature, &inputs, &outputs)
    }

    /// Spatial size `(width, height)` of an NCHW input, with a fallback for dynamic dims
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // Model dims are small
    pub fn input_size(&self, index: usize, fallback: (i32, i32)) -> (i32, i32) {
        self.session
            .inputs
            .get(index)
            .filter(|input| input.dimensions.len() == 4)
            .map_or(fallback, |input| {
                let height = input.dimensions[2].map_or(fallback.1, |h| h as i32);
                let width = input.dimensions[3].map_or(fallback.0, |w| w as i32);
                (width, height)
            })
    }

    /// Run one inference. Inputs are matched to the session by name when
    /// they are named, otherwise by position.
    ///
    /// # Errors
    ///
    /// Returns an error if an input is missing or the runtime fails
    pub fn run(&self, inputs: Vec<(&str, ArrayD<f32>)>) -> Result<Vec<ModelOutput>> {
        let ordered = order_inputs(&self.input_names(), inputs)?;

        let arrays: Vec<CowArray<'_, f32, ndarray::IxDyn>> = ordered.into_iter().map(CowArray::from).collect();
        let values = arrays
            .iter()
            .map(|array| Value::from_array(self.session.allocator(), array))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let outputs = self.session.run(values)?;

        let mut results = Vec::with_capacity(outputs.len());
        for (meta, value) in self.session.outputs.iter().zip(outputs.iter()) {
            let tensor = value.try_extract::<f32>()?;
            let view = tensor.view();
            results.push(ModelOutput {
                name: meta.name.clone(),
                shape: view.shape().to_vec(),
                data: view.iter().copied().collect(),
            });
        }

        Ok(results)
    }

    fn input_names(&self) -> Vec<String> {
        self.session.inputs.iter().map(|input| input.name.clone()).collect()
    }
}

/// Compare a model's tensors against a stage signature
fn check_signature(model: &str, signature: &ModelSignature, inputs: &[String], outputs: &[String]) -> Result<()> {
    let mut problems = Vec::new();

    if inputs.len() != signature.input_count {
        problems.push(format!(
            "expected {} inputs, found {}",
            signature.input_count,
            inputs.len()
        ));
    }
    for name in signature.named_inputs {
        if !inputs.iter().any(|input| input == name) {
            problems.push(format!("missing input {name}"));
        }
    }
    for name in signature.named_outputs {
        if !outputs.iter().any(|output| output == name) {
            problems.push(format!("missing output {name}"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::UnsupportedModel {
            model: model.to_string(),
            reason: problems.join(", "),
        })
    }
}

/// Arrange named inputs in session order. A single-input model takes its input regardless of name.
fn order_inputs(session_inputs: &[String], mut inputs: Vec<(&str, ArrayD<f32>)>) -> Result<Vec<ArrayD<f32>>> {
    if session_inputs.len() == 1 && inputs.len() == 1 {
        return Ok(inputs.into_iter().map(|(_, array)| array).collect());
    }

    let mut ordered = Vec::with_capacity(session_inputs.len());
    for name in session_inputs {
        let position = inputs
            .iter()
            .position(|(input_name, _)| input_name == name)
            .ok_or_else(|| Error::ModelError(format!("No tensor supplied for input {name}")))?;
        ordered.push(inputs.swap_remove(position).1);
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    const GAZE_SIGNATURE: ModelSignature = ModelSignature {
        input_count: 3,
        named_inputs: &["left_eye_image", "right_eye_image", "head_pose_angles"],
        named_outputs: &["gaze_vector"],
    };

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Gpu);
        assert_eq!("Myriad".parse::<Device>().unwrap(), Device::Myriad);
        assert_eq!("HETERO".parse::<Device>().unwrap(), Device::Hetero);
        assert!(matches!("FPGA".parse::<Device>(), Err(Error::ConfigError(_))));
        assert_eq!(Device::default().to_string(), "CPU");
    }

    #[test]
    fn test_check_signature_accepts_matching_model() {
        let inputs = names(&["head_pose_angles", "left_eye_image", "right_eye_image"]);
        let outputs = names(&["gaze_vector"]);
        assert!(check_signature("gaze", &GAZE_SIGNATURE, &inputs, &outputs).is_ok());
    }

    #[test]
    fn test_check_signature_lists_missing_tensors() {
        let inputs = names(&["left_eye_image", "right_eye_image"]);
        let outputs = names(&["output"]);
        match check_signature("gaze", &GAZE_SIGNATURE, &inputs, &outputs) {
            Err(Error::UnsupportedModel { model, reason }) => {
                assert_eq!(model, "gaze");
                assert!(reason.contains("expected 3 inputs, found 2"));
                assert!(reason.contains("missing input head_pose_angles"));
                assert!(reason.contains("missing output gaze_vector"));
            }
            other => panic!("Expected UnsupportedModel, got {other:?}"),
        }
    }

    #[test]
    fn test_order_inputs_follows_session_order() {
        let session = names(&["a", "b"]);
        let inputs = vec![("b", arr1(&[2.0f32]).into_dyn()), ("a", arr1(&[1.0f32]).into_dyn())];
        let ordered = order_inputs(&session, inputs).unwrap();
        assert_eq!(ordered[0][IxDyn(&[0])], 1.0);
        assert_eq!(ordered[1][IxDyn(&[0])], 2.0);
    }

    #[test]
    fn test_order_inputs_single_input_ignores_name() {
        let session = names(&["data"]);
        let inputs = vec![("image", arr1(&[5.0f32]).into_dyn())];
        assert_eq!(order_inputs(&session, inputs).unwrap().len(), 1);
    }

    #[test]
    fn test_order_inputs_missing_tensor() {
        let session = names(&["a", "b"]);
        let inputs = vec![("a", arr1(&[1.0f32]).into_dyn()), ("c", arr1(&[3.0f32]).into_dyn())];
        assert!(matches!(order_inputs(&session, inputs), Err(Error::ModelError(_))));
    }

    #[test]
    fn test_find_output() {
        let outputs = vec![ModelOutput {
            name: "angle_y_fc".to_string(),
            shape: vec![1, 1],
            data: vec![12.5],
        }];
        assert_eq!(find_output(&outputs, "angle_y_fc").unwrap().data[0], 12.5);
        assert!(find_output(&outputs, "angle_p_fc").is_err());
    }
}
