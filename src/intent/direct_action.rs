// src/intent/direct_action.rs
// Direct-action payload — precedence 2 in spec §4.5. Transport-native quick
// reply payloads of the form `order_item:<id>` / `add_to_cart:<id>`.

pub struct DirectAction {
    pub item_id: String,
}

pub fn parse(message: &str) -> Option<DirectAction> {
    for prefix in ["order_item:", "add_to_cart:"] {
        if let Some(id) = message.strip_prefix(prefix) {
            if !id.is_empty() {
                return Some(DirectAction { item_id: id.to_string() });
            }
        }
    }
    None
}
