pub mod annotation_renderer;
