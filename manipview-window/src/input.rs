use manipview_core::{Action, InputFrame};
use winit::event::{ElementState, MouseScrollDelta};
use winit::keyboard::KeyCode;

/// Pixels of wheel travel per line when the platform reports pixel deltas
const PIXELS_PER_LINE: f32 = 40.0;

pub fn action_for(code: KeyCode) -> Option<Action> {
    Some(match code {
        KeyCode::KeyW => Action::CameraForward,
        KeyCode::KeyS => Action::CameraBackward,
        KeyCode::KeyA => Action::CameraLeft,
        KeyCode::KeyD => Action::CameraRight,
        KeyCode::Digit1 | KeyCode::Numpad1 => Action::BaseIncrease,
        KeyCode::Digit2 | KeyCode::Numpad2 => Action::BaseDecrease,
        KeyCode::Digit3 | KeyCode::Numpad3 => Action::ShoulderIncrease,
        KeyCode::Digit4 | KeyCode::Numpad4 => Action::ShoulderDecrease,
        KeyCode::Digit5 | KeyCode::Numpad5 => Action::WristIncrease,
        KeyCode::Digit6 | KeyCode::Numpad6 => Action::WristDecrease,
        _ => return None,
    })
}

pub fn handle_key(input: &mut InputFrame, code: KeyCode, state: ElementState) {
    let Some(action) = action_for(code) else { return };
    match state {
        ElementState::Pressed => input.press(action),
        ElementState::Released => input.release(action),
    }
}

/// Raw device motion arrives with y growing downwards
pub fn handle_motion(input: &mut InputFrame, (dx, dy): (f64, f64)) {
    input.add_look(dx as f32, -dy as f32);
}

pub fn handle_wheel(input: &mut InputFrame, delta: MouseScrollDelta) {
    input.scroll += match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
    };
}
