pub mod capture {
    pub mod domain {
        pub mod countdown;
        pub mod frame_source;
        pub mod image_encoder;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_result;
        pub mod face_detector;
        pub mod gender_classifier;
        pub mod subject_detector;
    }
    pub mod infrastructure;
}

pub mod era {
    pub mod domain {
        pub mod era;
        pub mod group_description;
    }
    pub mod infrastructure;
}

pub mod export {
    pub mod domain {
        pub mod portrait_writer;
    }
    pub mod infrastructure;
}

pub mod generation {
    pub mod domain {
        pub mod image_editor;
        pub mod image_generator;
        pub mod prompt_builder;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capture_portrait_use_case;
    pub mod session_controller;
    pub mod session_logger;
}

pub mod session {
    pub mod domain {
        pub mod action;
        pub mod screen;
        pub mod session;
    }
}

pub mod shared {
    pub mod constants;
    pub mod encoded_image;
    pub mod frame;
}
