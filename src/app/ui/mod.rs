mod canvas;
mod controls;
mod details;
mod panels;
