use super::context::Transform;
use super::viewbox::ViewBox;

/// Distance from the top of the menu to the tip of its arrow.
pub const MENU_ARROW_OFFSET: f32 = 68.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowDirection {
    Left,
    Right,
}

/// Canvas-local screen position of the service menu. The menu itself is
/// never scaled with the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuPlacement {
    pub left: f32,
    pub top: f32,
    pub side: MenuSide,
    pub arrow: ArrowDirection,
}

pub fn place_menu(
    view: &ViewBox,
    transform: Transform,
    canvas_width: f32,
    menu_width: f32,
) -> MenuPlacement {
    let z = transform.scale;
    let translate = transform.translate;
    let origin = view.position();

    let screen_center_x = origin.x * z + translate.x + view.w * z / 2.0;
    let right_of_node = screen_center_x < canvas_width / 2.0;

    let top = origin.y * z + translate.y + view.relative_center().y * z - MENU_ARROW_OFFSET;
    let left = origin.x * z
        + translate.x
        + if right_of_node {
            view.w * z
        } else {
            -menu_width
        };

    if right_of_node {
        MenuPlacement {
            left,
            top,
            side: MenuSide::Right,
            arrow: ArrowDirection::Left,
        }
    } else {
        MenuPlacement {
            left,
            top,
            side: MenuSide::Left,
            arrow: ArrowDirection::Right,
        }
    }
}
