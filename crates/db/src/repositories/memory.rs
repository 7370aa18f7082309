use std::collections::BTreeMap;

use tokio::sync::RwLock;

use intake_core::domain::order::{NewOrder, Order, OrderId};

use super::{OrderRepository, RepositoryError};

/// Same id semantics as the SQL store: starts at 1, never reused.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    orders: BTreeMap<i64, Order>,
}

impl InMemoryOrderRepository {
    pub async fn all(&self) -> Vec<Order> {
        self.state.read().await.orders.values().cloned().collect()
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let stored = order.into_order(OrderId(state.last_id));
        state.orders.insert(stored.id.0, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.read().await.orders.get(&id.0).cloned())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.state.read().await.orders.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use intake_core::domain::order::NewOrder;
    use intake_core::domain::submission::Submission;

    use crate::repositories::{InMemoryOrderRepository, OrderRepository};

    #[tokio::test]
    async fn in_memory_order_repo_assigns_sequential_ids() {
        let repo = InMemoryOrderRepository::default();
        let submission = Submission {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            phone: "555 0100".to_string(),
            contact_method: None,
            message: None,
            country: None,
            username: None,
            verification_status: None,
            selected_card: None,
        };

        let first = repo.insert(NewOrder::new(submission.clone(), Utc::now())).await.expect("one");
        let second = repo.insert(NewOrder::new(submission, Utc::now())).await.expect("two");

        assert_eq!(first.id.0, 1);
        assert_eq!(second.id.0, 2);
        assert_eq!(repo.find_by_id(first.id).await.expect("find"), Some(first));
        assert_eq!(repo.count().await.expect("count"), 2);
        assert_eq!(repo.all().await.len(), 2);
    }
}
