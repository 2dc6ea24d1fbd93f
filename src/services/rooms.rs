//! Study room booking service

use reqwest::Method;

use crate::{
    api::ApiClient,
    error::AppResult,
    models::{
        envelope::Page,
        room::{CreateRoomBooking, Room, RoomBooking},
    },
};

#[derive(Clone)]
pub struct RoomsService {
    client: ApiClient,
}

impl RoomsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn rooms(&self) -> AppResult<Vec<Room>> {
        Ok(self.client.get_list("/api/rooms", &[]).await?.items)
    }

    pub async fn bookings(&self, page: u32, size: u32) -> AppResult<Page<RoomBooking>> {
        self.client
            .get_list(
                "/api/rooms/bookings",
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> AppResult<Page<RoomBooking>> {
        self.client
            .get_list(&format!("/api/rooms/bookings/user/{}", user_id), &[])
            .await
    }

    #[tracing::instrument(skip(self, booking), fields(room_id = booking.room_id))]
    pub async fn book(&self, booking: &CreateRoomBooking) -> AppResult<RoomBooking> {
        let response = self.client.post("/api/rooms/bookings", booking).await?;
        Ok(response.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: i64) -> AppResult<Option<String>> {
        self.client
            .send(Method::PUT, &format!("/api/rooms/bookings/{}/cancel", booking_id))
            .await
    }
}
