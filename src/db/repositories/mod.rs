mod availability_repository;
mod booking_repository;
mod notification_repository;
mod user_repository;

pub use availability_repository::AvailabilityRepository;
pub use booking_repository::BookingRepository;
pub use notification_repository::NotificationRepository;
pub use user_repository::UserRepository;
