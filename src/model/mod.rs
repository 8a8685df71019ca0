mod edge;
mod item;
mod node;
mod page;

pub use edge::EdgeModel;
pub use item::{INPUT_ITEM_PREFIX, InputType, ItemData, ItemId, ItemModel};
pub use node::{NodeModel, Position};
pub use page::{GraphModel, OwnerId, PageModel};
