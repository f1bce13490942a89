use ricochet_core::Buttons;

/// Raw player intent for one frame, gathered from keyboard and mouse state by
/// [`crate::game::Input`]. Sequencing metadata (`seq`, `client_tick`,
/// timestamps) is the connection's concern, not this struct's — see
/// [`crate::net::NetworkClient::update`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub move_x: f32,
    pub move_y: f32,
    pub aim_angle: f32,
    pub cursor_world_x: f32,
    pub cursor_world_y: f32,
    pub shoot: bool,
    pub roll: bool,
    pub reload: bool,
    pub ability: bool,
    pub jump: bool,
    pub debug_spawn: bool,
}

impl InputState {
    pub fn buttons(&self) -> Buttons {
        let mut buttons = Buttons::empty();
        if self.move_y > 0.0 {
            buttons |= Buttons::MOVE_UP;
        }
        if self.move_y < 0.0 {
            buttons |= Buttons::MOVE_DOWN;
        }
        if self.move_x < 0.0 {
            buttons |= Buttons::MOVE_LEFT;
        }
        if self.move_x > 0.0 {
            buttons |= Buttons::MOVE_RIGHT;
        }
        buttons.set(Buttons::SHOOT, self.shoot);
        buttons.set(Buttons::ROLL, self.roll);
        buttons.set(Buttons::RELOAD, self.reload);
        buttons.set(Buttons::ABILITY, self.ability);
        buttons.set(Buttons::JUMP, self.jump);
        buttons.set(Buttons::DEBUG_SPAWN, self.debug_spawn);
        buttons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_reflect_move_direction() {
        let state = InputState {
            move_x: -1.0,
            shoot: true,
            ..Default::default()
        };
        let buttons = state.buttons();
        assert!(buttons.contains(Buttons::MOVE_LEFT));
        assert!(buttons.contains(Buttons::SHOOT));
        assert!(!buttons.contains(Buttons::MOVE_RIGHT));
    }
}
