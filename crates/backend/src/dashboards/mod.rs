pub mod d402_sales_panel;
