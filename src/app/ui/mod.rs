mod controls;
mod details;
mod dialogs;
mod menu;
mod panels;
