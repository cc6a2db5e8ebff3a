use async_trait::async_trait;

/// Trait for generating human-readable room codes
#[async_trait]
pub trait RoomCodeGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// Pet name-based room code generator ("proud-salmon-ridge" style)
pub struct PetnameRoomCodeGenerator;

impl PetnameRoomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PetnameRoomCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomCodeGenerator for PetnameRoomCodeGenerator {
    async fn generate(&self) -> String {
        petname::Petnames::default().generate_one(3, "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_petname_room_code_generator() {
        let generator = PetnameRoomCodeGenerator::new();
        let code = generator.generate().await;

        assert!(!code.is_empty());
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
    }
}
