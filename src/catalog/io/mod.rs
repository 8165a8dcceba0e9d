pub mod csv_read;
pub mod csv_write;
pub mod excel_write;
pub mod twb_read;
