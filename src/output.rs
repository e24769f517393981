pub mod output_tabular;
pub mod path_buf_ext;
