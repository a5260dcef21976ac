//! On-screen buttons held for the life of a contact, sent as `btn` or `key` messages.

use std::collections::HashMap;
use tracing::debug;

use super::input_event::ContactId;
use crate::emission::{ControlEvent, Outbox};
use crate::layout::Binding;

fn binding_event(binding: &Binding, pressed: bool) -> ControlEvent {
    let val = pressed as u8;
    match binding {
        Binding::Logical(id) => ControlEvent::Btn {
            id: id.clone(),
            val,
        },
        Binding::RawKey(key) => ControlEvent::Key {
            key: key.clone(),
            val,
        },
    }
}

/// Held on-screen buttons, keyed by the contact pressing them.
///
/// The binding is captured at press time so the release always matches the
/// press, even if the element is reconfigured or removed in between.
#[derive(Debug, Default)]
pub struct ButtonPresses {
    held: HashMap<ContactId, (String, Binding)>,
}

impl ButtonPresses {
    pub fn owns(&self, id: ContactId) -> bool {
        self.held.contains_key(&id)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    pub fn press(&mut self, id: ContactId, element: &str, binding: &Binding, outbox: &mut Outbox) {
        if self.held.contains_key(&id) {
            return;
        }
        debug!("Button {} pressed by {:?}", element, id);
        outbox.push(binding_event(binding, true));
        self.held.insert(id, (element.to_string(), binding.clone()));
    }

    pub fn release(&mut self, id: ContactId, outbox: &mut Outbox) -> bool {
        match self.held.remove(&id) {
            Some((element, binding)) => {
                debug!("Button {} released by {:?}", element, id);
                outbox.push(binding_event(&binding, false));
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self, outbox: &mut Outbox) {
        let ids: Vec<ContactId> = self.held.keys().copied().collect();
        for id in ids {
            self.release(id, outbox);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_and_raw_bindings_use_their_own_message_kind() {
        let mut buttons = ButtonPresses::default();
        let mut out = Outbox::default();
        buttons.press(ContactId::Touch(1), "btn-a", &Binding::Logical("A".into()), &mut out);
        buttons.press(ContactId::Touch(2), "btn-w", &Binding::RawKey("KEY_W".into()), &mut out);
        buttons.release(ContactId::Touch(2), &mut out);
        buttons.release(ContactId::Touch(1), &mut out);

        assert_eq!(
            out.immediate,
            vec![
                ControlEvent::Btn { id: "A".into(), val: 1 },
                ControlEvent::Key { key: "KEY_W".into(), val: 1 },
                ControlEvent::Key { key: "KEY_W".into(), val: 0 },
                ControlEvent::Btn { id: "A".into(), val: 0 },
            ]
        );
        assert_eq!(buttons.held_count(), 0);
    }

    #[test]
    fn release_of_unknown_contact_is_a_no_op() {
        let mut buttons = ButtonPresses::default();
        let mut out = Outbox::default();
        assert!(!buttons.release(ContactId::Mouse, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn release_all_lets_go_of_everything() {
        let mut buttons = ButtonPresses::default();
        let mut out = Outbox::default();
        buttons.press(ContactId::Touch(1), "dpad_up", &Binding::Logical("DPAD_UP".into()), &mut out);
        buttons.press(ContactId::Touch(2), "dpad_left", &Binding::Logical("DPAD_LEFT".into()), &mut out);
        out.immediate.clear();

        buttons.release_all(&mut out);
        assert_eq!(out.immediate.len(), 2);
        assert!(out
            .immediate
            .iter()
            .all(|e| matches!(e, ControlEvent::Btn { val: 0, .. })));
        assert!(!buttons.owns(ContactId::Touch(1)));
    }
}
