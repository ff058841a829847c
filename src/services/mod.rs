pub mod evaluation_service;
pub mod extraction_service;
pub mod grading_service;
pub mod key_service;
