/// BlazeFace face model using ONNX Runtime via `ort`.
///
/// Produces bounding boxes, a confidence and the six BlazeFace keypoints per
/// face. Decoding, NMS and anchor generation follow the short-range model.
use std::path::Path;

use async_trait::async_trait;

use crate::detection::domain::detection::{Detection, NUM_LANDMARKS};
use crate::detection::domain::face_model::{FaceModel, ModelLoadError, ModelLoader};
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: 4 box + 6 keypoints * 2.
const REGRESSOR_STRIDE: usize = 4 + NUM_LANDMARKS * 2;

/// BlazeFace model backed by an ONNX Runtime session.
pub struct OnnxBlazefaceModel {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceModel {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let fw = frame.width() as f32;
        let fh = frame.height() as f32;

        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw_dets = Vec::new();
        let num_anchors = self.anchors.len().min(NUM_ANCHORS);

        for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
            let score = sigmoid(raw_score);
            if (score as f64) < self.confidence {
                continue;
            }

            let reg_offset = i * REGRESSOR_STRIDE;
            if reg_offset + REGRESSOR_STRIDE > reg_data.len() {
                break;
            }
            let reg = &reg_data[reg_offset..reg_offset + REGRESSOR_STRIDE];
            raw_dets.push(decode(&self.anchors[i], reg, score, fw, fh));
        }

        let filtered = nms(&mut raw_dets, NMS_IOU_THRESH);
        Ok(filtered.into_iter().map(RawDet::into_detection).collect())
    }
}

#[async_trait]
impl FaceModel for OnnxBlazefaceModel {
    async fn estimate_faces(&mut self, frame: &Frame) -> Vec<Detection> {
        match self.infer(frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("BlazeFace inference failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        }
    }
}

/// Loads [`OnnxBlazefaceModel`] and proves the session with one warm-up run.
pub struct OnnxModelLoader {
    confidence: f64,
}

impl OnnxModelLoader {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self, backend_path: &Path) -> Result<Box<dyn FaceModel>, ModelLoadError> {
        if !backend_path.exists() {
            return Err(ModelLoadError::NotFound(backend_path.display().to_string()));
        }
        let mut model = OnnxBlazefaceModel::new(backend_path, self.confidence)
            .map_err(|e| ModelLoadError::Backend(e.to_string()))?;
        model
            .infer(&Frame::blank(INPUT_SIZE, INPUT_SIZE))
            .map_err(|e| ModelLoadError::Backend(format!("warm-up inference failed: {e}")))?;
        log::info!("Loaded BlazeFace model from {}", backend_path.display());
        Ok(Box::new(model))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
///
/// Only the first three channels are read, so RGBA frames work unchanged.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchors and decoding
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchors for the short-range model.
///
/// Two feature map sizes, 16×16 and 8×8, with 2 and 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Decode one anchor's regressor row into frame pixel coordinates.
fn decode(anchor: &[f32; 2], reg: &[f32], score: f32, fw: f32, fh: f32) -> RawDet {
    let size = INPUT_SIZE as f32;
    let cx = anchor[0] + reg[0] / size;
    let cy = anchor[1] + reg[1] / size;
    let w = reg[2] / size;
    let h = reg[3] / size;

    let mut landmarks = [(0.0f64, 0.0f64); NUM_LANDMARKS];
    for (k, point) in landmarks.iter_mut().enumerate() {
        let kx = anchor[0] + reg[4 + k * 2] / size;
        let ky = anchor[1] + reg[4 + k * 2 + 1] / size;
        *point = ((kx * fw) as f64, (ky * fh) as f64);
    }

    RawDet {
        x1: ((cx - w / 2.0) * fw).max(0.0) as f64,
        y1: ((cy - h / 2.0) * fh).max(0.0) as f64,
        x2: ((cx + w / 2.0) * fw).min(fw) as f64,
        y2: ((cy + h / 2.0) * fh).min(fh) as f64,
        score: score as f64,
        landmarks,
    }
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDet {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    score: f64,
    landmarks: [(f64, f64); NUM_LANDMARKS],
}

impl RawDet {
    fn into_detection(self) -> Detection {
        Detection::new((self.x1, self.y1), (self.x2, self.y2), self.score)
            .with_landmarks(self.landmarks)
    }
}

fn nms(dets: &mut [RawDet], iou_thresh: f64) -> Vec<RawDet> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] {
                continue;
            }
            if bbox_iou(&dets[i], &dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &RawDet, b: &RawDet) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
