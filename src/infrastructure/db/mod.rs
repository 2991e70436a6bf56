pub mod report_results;
