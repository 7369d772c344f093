pub mod onnx_blazeface_model;
