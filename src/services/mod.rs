/// Health check service.
pub mod health_service;
/// Room intent handlers and broadcast fan-out.
pub mod room_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
