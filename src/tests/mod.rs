mod geocoding_tests;
mod pipeline_tests;
