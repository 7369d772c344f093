pub mod shared {
    pub mod configuration;
    pub mod constants;
    pub mod frame;
    pub mod rectangle;
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod face_model;
    }
    pub mod infrastructure;
}

pub mod source {
    pub mod domain {
        pub mod camera;
        pub mod image_fetcher;
        pub mod media_source;
        pub mod source_error;
        pub mod stream_geometry;
    }
    pub mod infrastructure;
}

pub mod rendering {
    pub mod domain {
        pub mod color;
        pub mod render_surface;
    }
    pub mod infrastructure;
}

pub mod events {
    pub mod domain {
        pub mod event_emitter;
        pub mod pipeline_event;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capture_loop;
    pub mod face_detector_pipeline;
    pub mod frame_stager;
    pub mod inference_invoker;
    pub mod pagination_navigator;
    pub mod pipeline_error;
    pub mod pipeline_state;
    pub mod source_provider;
}
