use std::collections::HashSet;

use winit::keyboard::KeyCode;

use crate::net::InputState;

#[derive(Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    mouse_delta: (f64, f64),
    scroll_jump_pending: bool,
    mouse_down: bool,
    pub cursor_captured: bool,
}

impl Input {
    /// Builds this frame's world-space move intent and button mask.
    /// `aim_angle` comes from the camera's yaw, since this demo client has no
    /// 2D cursor-to-world projection; a top-down renderer would derive it
    /// from the cursor position instead.
    pub fn to_input_state(&self, aim_angle: f32) -> InputState {
        let mut move_x = 0.0;
        let mut move_y = 0.0;

        if self.is_right_held() {
            move_x += 1.0;
        }
        if self.is_left_held() {
            move_x -= 1.0;
        }
        if self.is_forward_held() {
            move_y += 1.0;
        }
        if self.is_backward_held() {
            move_y -= 1.0;
        }

        let len_sq = move_x * move_x + move_y * move_y;
        if len_sq > 1.0 {
            let len = len_sq.sqrt();
            move_x /= len;
            move_y /= len;
        }

        InputState {
            move_x,
            move_y,
            aim_angle,
            cursor_world_x: 0.0,
            cursor_world_y: 0.0,
            shoot: self.mouse_down,
            roll: self.is_shift_held(),
            reload: self.is_key_held(KeyCode::KeyR),
            ability: self.is_key_held(KeyCode::KeyE),
            jump: self.is_jump_held() || self.scroll_jump_pending,
            debug_spawn: false,
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_shift_held(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    pub fn is_ctrl_held(&self) -> bool {
        self.is_key_held(KeyCode::ControlLeft) || self.is_key_held(KeyCode::ControlRight)
    }

    pub fn is_forward_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyW)
    }

    pub fn is_backward_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyS)
    }

    pub fn is_left_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyA)
    }

    pub fn is_right_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyD)
    }

    pub fn is_jump_held(&self) -> bool {
        self.is_key_held(KeyCode::Space)
    }

    pub fn is_crouch_held(&self) -> bool {
        self.is_ctrl_held()
    }

    pub fn accumulate_mouse_delta(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0;
        self.mouse_delta.1 += delta.1;
    }

    pub fn consume_mouse_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.mouse_delta)
    }

    pub fn trigger_scroll_jump(&mut self) {
        self.scroll_jump_pending = true;
    }

    pub fn consume_scroll_jump(&mut self) -> bool {
        std::mem::take(&mut self.scroll_jump_pending)
    }

    pub fn set_mouse_down(&mut self, down: bool) {
        self.mouse_down = down;
    }
}
