mod interaction;
mod scene;
mod view;

pub(super) use scene::CanvasScene;
