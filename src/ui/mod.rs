pub mod gantt_chart;
pub mod pane;
pub mod task_table;
pub mod theme;
pub mod toolbar;
