use crate::board::{Board, Color, Piece};
use crate::moves::types::Move;

/// Most Valuable Victim / Least Valuable Attacker capture score. Victims
/// dominate (x10) so a pawn taking a queen outranks a queen taking a
/// rook; the attacker ordinal breaks ties toward the cheaper piece.
pub fn mvv_lva_score(mv: Move, board: &Board) -> i32 {
    if let Some((_, victim)) = board.piece_at(mv.to()) {
        let attacker = board
            .piece_type_at(mv.from())
            .expect("capture from empty square");
        return victim.value() * 10 - attacker.attacker_value();
    }

    // En passant: the destination is empty, the victim is a pawn.
    if mv.is_en_passant() {
        return 100 * 10 - 1;
    }

    0
}

/// Quiet-move ordering score: history heuristic plus a nudge for pawns
/// making progress toward promotion.
pub fn quiet_score(mv: Move, board: &Board, history: &[[i32; 64]; 64]) -> i32 {
    let mut score = history[mv.from().index() as usize][mv.to().index() as usize];

    if board.piece_type_at(mv.from()) == Some(Piece::Pawn) {
        let to_rank = mv.to().rank();
        let from_rank = mv.from().rank();
        let advancing = match board.side_to_move {
            Color::White => to_rank > from_rank,
            Color::Black => to_rank < from_rank,
        };
        if advancing {
            if to_rank == 3 || to_rank == 4 {
                score += 1000;
            }
            if to_rank == 5 || to_rank == 6 {
                score += 2000;
            }
        }
    }

    score
}
