mod common;
mod rules;
mod segmentation;
